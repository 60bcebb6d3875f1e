//! The lock graph: a directed multigraph over [`LockId`]s, built by
//! replaying each thread's event file independently and merging the
//! resulting edges into one shared graph.

use crate::core::events::ThreadEvent;
use crate::core::types::{Gatelocks, LockDebugInfo, LockId, Segment, ThreadId};
use crate::error::{CoreError, CoreResult};
use fxhash::{FxHashMap, FxHashSet};

/// The label carried by one lock-graph edge: everything needed to decide,
/// later, whether a cycle through this edge is a genuine potential
/// deadlock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeLabel {
    /// Segment the source lock was acquired in.
    pub s1: Segment,
    /// Segment the target lock was acquired in.
    pub s2: Segment,
    pub thread: ThreadId,
    /// Locks the thread already held, excluding the source and target.
    pub gatelocks: Gatelocks,
    pub l1_info: LockDebugInfo,
    pub l2_info: LockDebugInfo,
}

/// One edge, as returned by traversal: the (from, to) vertex indices plus
/// the label. Valid only against the `LockGraph` it came from.
#[derive(Debug, Clone)]
pub struct EdgeRef {
    pub from: usize,
    pub to: usize,
    pub label: EdgeLabel,
}

#[derive(Debug, Default)]
pub struct LockGraph {
    vertex_index: FxHashMap<LockId, usize>,
    vertices: Vec<LockId>,
    adjacency: Vec<Vec<(usize, EdgeLabel)>>,
}

impl LockGraph {
    pub fn empty() -> Self {
        LockGraph::default()
    }

    /// Replay every thread's events (order across threads doesn't matter;
    /// each thread's own events must be in emission order) into one graph.
    pub fn build(thread_events: &[(ThreadId, Vec<ThreadEvent>)]) -> CoreResult<Self> {
        let mut graph = LockGraph::default();
        for (thread, events) in thread_events {
            replay_thread(&mut graph, *thread, events)?;
        }
        Ok(graph)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn lock_at(&self, idx: usize) -> LockId {
        self.vertices[idx]
    }

    pub fn vertex_index(&self, lock: LockId) -> Option<usize> {
        self.vertex_index.get(&lock).copied()
    }

    pub fn edges_from(&self, idx: usize) -> impl Iterator<Item = EdgeRef> + '_ {
        self.adjacency[idx]
            .iter()
            .map(move |(to, label)| EdgeRef {
                from: idx,
                to: *to,
                label: label.clone(),
            })
    }

    pub fn vertex_indices(&self) -> impl Iterator<Item = usize> {
        0..self.vertices.len()
    }

    fn ensure_vertex(&mut self, lock: LockId) -> usize {
        if let Some(&idx) = self.vertex_index.get(&lock) {
            return idx;
        }
        let idx = self.vertices.len();
        self.vertices.push(lock);
        self.adjacency.push(Vec::new());
        self.vertex_index.insert(lock, idx);
        idx
    }

    fn add_edge(&mut self, from: LockId, to: LockId, label: EdgeLabel) {
        let from_idx = self.ensure_vertex(from);
        let to_idx = self.ensure_vertex(to);
        let already_present = self.adjacency[from_idx]
            .iter()
            .any(|(t, l)| *t == to_idx && *l == label);
        if !already_present {
            self.adjacency[from_idx].push((to_idx, label));
        }
    }
}

struct HeldLock {
    lock: LockId,
    segment: Segment,
    info: LockDebugInfo,
}

fn replay_thread(graph: &mut LockGraph, thread: ThreadId, events: &[ThreadEvent]) -> CoreResult<()> {
    let Some(first) = events.first() else {
        return Ok(());
    };
    match first {
        ThreadEvent::SegmentHop(_) | ThreadEvent::Acquire(_) | ThreadEvent::RecursiveAcquire(_) => {}
        other => {
            return Err(CoreError::EventType {
                expected: "SegmentHop, Acquire or RecursiveAcquire",
                actual: other.variant_name(),
            });
        }
    }

    let mut held: Vec<HeldLock> = Vec::new();
    let mut recursive_count: FxHashMap<LockId, usize> = FxHashMap::default();
    let mut current_segment = Segment::INITIAL;

    for event in events {
        let event_thread = event.thread_of();
        if event_thread != thread {
            return Err(CoreError::EventThread {
                file_thread: thread,
                event_thread,
            });
        }

        match event {
            ThreadEvent::SegmentHop(hop) => {
                current_segment = hop.new_segment;
            }
            ThreadEvent::Acquire(a) => {
                acquire(graph, &mut held, thread, current_segment, a.lock, &a.debug_info);
            }
            ThreadEvent::RecursiveAcquire(a) => {
                let count = recursive_count.entry(a.lock).or_insert(0);
                let was_zero = *count == 0;
                *count = count
                    .checked_add(1)
                    .ok_or(CoreError::RecursiveLockOverflow(a.lock))?;
                if was_zero {
                    acquire(graph, &mut held, thread, current_segment, a.lock, &a.debug_info);
                }
            }
            ThreadEvent::Release(r) => {
                release(&mut held, thread, r.lock)?;
            }
            ThreadEvent::RecursiveRelease(r) => {
                let count = recursive_count
                    .get_mut(&r.lock)
                    .filter(|c| **c > 0)
                    .ok_or(CoreError::UnexpectedRelease {
                        thread,
                        lock: r.lock,
                    })?;
                *count -= 1;
                if *count == 0 {
                    release(&mut held, thread, r.lock)?;
                }
            }
        }
    }

    Ok(())
}

fn acquire(
    graph: &mut LockGraph,
    held: &mut Vec<HeldLock>,
    thread: ThreadId,
    current_segment: Segment,
    lock: LockId,
    info: &LockDebugInfo,
) {
    graph.ensure_vertex(lock);
    let gatelocks = Gatelocks::new(held.iter().map(|h| h.lock).collect::<FxHashSet<_>>());

    for held_lock in held.iter() {
        let label = EdgeLabel {
            s1: held_lock.segment,
            s2: current_segment,
            thread,
            gatelocks: gatelocks.clone(),
            l1_info: held_lock.info.clone(),
            l2_info: info.clone(),
        };
        graph.add_edge(held_lock.lock, lock, label);
    }

    held.push(HeldLock {
        lock,
        segment: current_segment,
        info: info.clone(),
    });
}

fn release(held: &mut Vec<HeldLock>, thread: ThreadId, lock: LockId) -> CoreResult<()> {
    let before = held.len();
    held.retain(|h| h.lock != lock);
    if held.len() == before {
        return Err(CoreError::UnexpectedRelease { thread, lock });
    }
    Ok(())
}
