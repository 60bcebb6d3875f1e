//! The analysis entry point: load a recorded repository and answer
//! questions about it without re-exposing the lower-level graph machinery.

use crate::core::analyzer::{DeadlockAnalyzer, PotentialDeadlock};
use crate::core::events::ThreadEvent;
use crate::core::graph::{LockGraph, SegmentationGraph};
use crate::core::store::FilesystemStore;
use crate::core::types::ThreadId;
use crate::error::CoreResult;
use std::path::Path;

/// A fully replayed view of one recorded run, ready for queries.
pub struct Skeleton {
    lock_graph: LockGraph,
    segments: SegmentationGraph,
    thread_count: usize,
}

impl Skeleton {
    /// Open the repository at `path` and replay every event in it.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let store = FilesystemStore::open_existing(path)?;

        let process_events = store.read_process_events()?;
        let segments = SegmentationGraph::build(&process_events)?;

        let thread_files = store.thread_files()?;
        let mut thread_events: Vec<(ThreadId, Vec<ThreadEvent>)> = Vec::with_capacity(thread_files.len());
        for (thread, path) in &thread_files {
            thread_events.push((*thread, store.read_thread_events(path)?));
        }
        let thread_count = thread_events.len();
        let lock_graph = LockGraph::build(&thread_events)?;

        Ok(Skeleton {
            lock_graph,
            segments,
            thread_count,
        })
    }

    pub fn number_of_threads(&self) -> usize {
        self.thread_count
    }

    pub fn number_of_locks(&self) -> usize {
        self.lock_graph.vertex_count()
    }

    /// Every potential deadlock found in the replayed run.
    pub fn deadlocks(&self) -> Vec<PotentialDeadlock> {
        DeadlockAnalyzer::new(&self.lock_graph, &self.segments).find()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::framework::Framework;
    use crate::core::types::LockId;

    #[test]
    fn loads_a_recorded_run_and_counts_threads_and_locks() {
        let dir = tempfile::tempdir().unwrap();
        let framework = Framework::new_for_test();
        framework.set_repository(dir.path()).unwrap();
        framework.enable();

        framework.notify_start(ThreadId(0), ThreadId(1));
        framework.notify_acquire(ThreadId(0), LockId(1));
        framework.notify_release(ThreadId(0), LockId(1));
        framework.notify_acquire(ThreadId(1), LockId(2));
        framework.notify_release(ThreadId(1), LockId(2));
        framework.notify_join(ThreadId(0), ThreadId(1));
        framework.unset_repository();

        let skeleton = Skeleton::load(dir.path()).unwrap();
        assert_eq!(skeleton.number_of_threads(), 2);
        assert_eq!(skeleton.number_of_locks(), 2);
        assert!(skeleton.deadlocks().is_empty());
    }
}
