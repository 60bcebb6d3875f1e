//! The process-wide singleton dispatcher. Instrumented programs call the
//! six `notify_*` entry points (directly, or via language bindings in
//! [`crate::ffi`]); the framework turns them into persisted events and
//! maintains the segment bookkeeping that encodes happens-before between
//! threads.

use crate::core::call_stack;
use crate::core::events::{
    Acquire, Join, ProcessEvent, RecursiveAcquire, RecursiveRelease, Release, SegmentHop, Start,
    ThreadEvent,
};
use crate::core::store::{Event, FilesystemStore};
use crate::core::types::{LockId, Segment, ThreadId};
use crate::error::CoreResult;
use fxhash::FxHashMap;
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Segment bookkeeping guarded by one mutex, per the concurrency model:
/// `segment_of` and `current_segment` change together under `notify_start`
/// and `notify_join`.
struct SegmentState {
    next_segment: usize,
    segment_of: FxHashMap<ThreadId, Segment>,
}

impl SegmentState {
    fn new() -> Self {
        SegmentState {
            next_segment: 1, // Segment 0 is the distinguished initial segment.
            segment_of: FxHashMap::default(),
        }
    }

    fn fresh_segment(&mut self) -> Segment {
        let s = Segment(self.next_segment);
        self.next_segment += 1;
        s
    }
}

/// The process-wide dispatcher singleton.
pub struct Framework {
    enabled: AtomicBool,
    store: RwLock<Option<Arc<FilesystemStore>>>,
    segments: Mutex<SegmentState>,
}

impl Framework {
    fn new() -> Self {
        Framework {
            enabled: AtomicBool::new(false),
            store: RwLock::new(None),
            segments: Mutex::new(SegmentState::new()),
        }
    }

    /// A freestanding instance for tests that need their own framework
    /// rather than the process-wide singleton.
    #[cfg(test)]
    pub(crate) fn new_for_test() -> Self {
        Self::new()
    }
}

static FRAMEWORK: OnceLock<Framework> = OnceLock::new();

/// The lazily-initialized process-wide framework instance.
pub fn framework() -> &'static Framework {
    FRAMEWORK.get_or_init(Framework::new)
}

impl Framework {
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
        log::debug!("event logging enabled");
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        log::debug!("event logging disabled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Construct a new store at `path` off the hot path and, on success,
    /// atomically swap it in. On failure the previously active store (if
    /// any) remains active.
    pub fn set_repository<P: AsRef<Path>>(&self, path: P) -> CoreResult<()> {
        let store = FilesystemStore::create(path)?;
        *self.store.write() = Some(Arc::new(store));
        log::debug!("repository set");
        Ok(())
    }

    /// Atomically drop the active store, if any.
    pub fn unset_repository(&self) {
        *self.store.write() = None;
        log::debug!("repository unset");
    }

    fn store_snapshot(&self) -> Option<Arc<FilesystemStore>> {
        self.store.read().clone()
    }

    fn dispatch(&self, event: Event) {
        let Some(store) = self.store_snapshot() else {
            return;
        };
        if let Err(e) = store.dispatch(event) {
            log::warn!("dropping repository after dispatch error: {e}");
            self.unset_repository();
        }
    }

    pub fn notify_acquire(&self, thread: ThreadId, lock: LockId) {
        if !self.is_enabled() {
            return;
        }
        let debug_info = call_stack::capture(1);
        self.dispatch(Event::Thread(ThreadEvent::Acquire(Acquire {
            thread,
            lock,
            debug_info,
        })));
    }

    pub fn notify_release(&self, thread: ThreadId, lock: LockId) {
        if !self.is_enabled() {
            return;
        }
        self.dispatch(Event::Thread(ThreadEvent::Release(Release {
            thread,
            lock,
        })));
    }

    pub fn notify_recursive_acquire(&self, thread: ThreadId, lock: LockId) {
        if !self.is_enabled() {
            return;
        }
        let debug_info = call_stack::capture(1);
        self.dispatch(Event::Thread(ThreadEvent::RecursiveAcquire(
            RecursiveAcquire {
                thread,
                lock,
                debug_info,
            },
        )));
    }

    pub fn notify_recursive_release(&self, thread: ThreadId, lock: LockId) {
        if !self.is_enabled() {
            return;
        }
        self.dispatch(Event::Thread(ThreadEvent::RecursiveRelease(
            RecursiveRelease { thread, lock },
        )));
    }

    pub fn notify_start(&self, parent: ThreadId, child: ThreadId) {
        if !self.is_enabled() {
            return;
        }
        assert_ne!(parent, child, "notify_start: parent and child must differ");

        let (parent_segment, new_parent_segment, child_segment) = {
            let mut state = self.segments.lock();
            let parent_segment = match state.segment_of.get(&parent).copied() {
                Some(s) => s,
                None => {
                    assert!(
                        state.segment_of.is_empty(),
                        "notify_start: parent thread has no segment"
                    );
                    Segment::INITIAL
                }
            };
            let new_parent_segment = state.fresh_segment();
            let child_segment = state.fresh_segment();
            state.segment_of.insert(parent, new_parent_segment);
            state.segment_of.insert(child, child_segment);
            (parent_segment, new_parent_segment, child_segment)
        };

        self.dispatch(Event::Process(ProcessEvent::Start(Start {
            parent_segment,
            new_parent_segment,
            child_segment,
        })));
        self.dispatch(Event::Thread(ThreadEvent::SegmentHop(SegmentHop {
            thread: parent,
            new_segment: new_parent_segment,
        })));
        self.dispatch(Event::Thread(ThreadEvent::SegmentHop(SegmentHop {
            thread: child,
            new_segment: child_segment,
        })));
    }

    pub fn notify_join(&self, parent: ThreadId, child: ThreadId) {
        if !self.is_enabled() {
            return;
        }
        assert_ne!(parent, child, "notify_join: parent and child must differ");

        let (parent_segment, child_segment, new_parent_segment) = {
            let mut state = self.segments.lock();
            let parent_segment = *state
                .segment_of
                .get(&parent)
                .expect("notify_join: parent thread has no segment");
            let child_segment = *state
                .segment_of
                .get(&child)
                .expect("notify_join: child thread has no segment");
            let new_parent_segment = state.fresh_segment();
            state.segment_of.insert(parent, new_parent_segment);
            state.segment_of.remove(&child);
            (parent_segment, child_segment, new_parent_segment)
        };

        self.dispatch(Event::Process(ProcessEvent::Join(Join {
            parent_segment,
            new_parent_segment,
            child_segment,
        })));
        self.dispatch(Event::Thread(ThreadEvent::SegmentHop(SegmentHop {
            thread: parent,
            new_segment: new_parent_segment,
        })));
    }
}

/// Small builder mirroring the teacher crate's configuration style: wires up
/// a repository path and enables logging in one call.
pub struct Recorder {
    repository: Option<std::path::PathBuf>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    pub fn new() -> Self {
        Recorder { repository: None }
    }

    pub fn with_repository<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.repository = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the repository (if configured) and enable event logging.
    pub fn start(self) -> CoreResult<()> {
        if let Some(path) = self.repository {
            framework().set_repository(path)?;
        }
        framework().enable();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{LockId, ThreadId};

    #[test]
    fn enable_disable_are_idempotent() {
        let f = Framework::new();
        f.enable();
        f.enable();
        assert!(f.is_enabled());
        f.disable();
        f.disable();
        assert!(!f.is_enabled());
    }

    #[test]
    fn set_then_unset_repository_restores_no_repository_state() {
        let f = Framework::new();
        let dir = tempfile::tempdir().unwrap();
        f.set_repository(dir.path()).unwrap();
        assert!(f.store_snapshot().is_some());
        f.unset_repository();
        assert!(f.store_snapshot().is_none());
    }

    #[test]
    fn failed_set_repository_keeps_previous_store_active() {
        let f = Framework::new();
        let dir = tempfile::tempdir().unwrap();
        f.set_repository(dir.path()).unwrap();

        let bad_path = dir.path().join("not_a_dir");
        std::fs::write(&bad_path, b"x").unwrap();
        assert!(f.set_repository(&bad_path).is_err());
        assert!(f.store_snapshot().is_some());
    }

    #[test]
    fn disabled_framework_does_not_touch_repository() {
        let f = Framework::new();
        let dir = tempfile::tempdir().unwrap();
        f.set_repository(dir.path()).unwrap();
        // not enabled
        f.notify_acquire(ThreadId(1), LockId(1));
        let store = f.store_snapshot().unwrap();
        assert!(store.thread_files().unwrap().is_empty());
    }

    #[test]
    fn start_join_segment_bookkeeping() {
        let f = Framework::new();
        let dir = tempfile::tempdir().unwrap();
        f.set_repository(dir.path()).unwrap();
        f.enable();

        f.notify_start(ThreadId(0), ThreadId(1));
        let state = f.segments.lock();
        assert_eq!(state.segment_of.get(&ThreadId(0)), Some(&Segment(1)));
        assert_eq!(state.segment_of.get(&ThreadId(1)), Some(&Segment(2)));
    }
}
