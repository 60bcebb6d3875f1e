//! Filters the cycles found in a [`LockGraph`] down to genuine potential
//! deadlocks: a cycle is only reported if every ordered pair of edges in it
//! runs on distinct threads, holds disjoint sets of other locks, and is not
//! provably ordered by happens-before.

use crate::core::cycle_engine::{self, Cycle};
use crate::core::graph::{EdgeRef, LockGraph, SegmentationGraph};
use crate::core::types::{LockDebugInfo, LockId, ThreadId};
use std::fmt;

/// One thread's participation in a potential deadlock: it holds every lock
/// in `held_locks` (the edge's source lock, followed by its gatelocks) and
/// is blocked waiting to acquire `waiting_lock`.
#[derive(Debug, Clone)]
pub struct DeadlockedThread {
    pub thread: ThreadId,
    pub held_locks: Vec<LockId>,
    pub waiting_lock: LockId,
    pub held_info: LockDebugInfo,
    pub waiting_info: LockDebugInfo,
}

impl DeadlockedThread {
    /// The lock whose acquisition formed this edge (always `held_locks[0]`).
    pub fn source_lock(&self) -> LockId {
        self.held_locks[0]
    }
}

/// A cycle through the lock graph that survived the pairwise deadlock
/// filter: a set of threads each waiting on a lock held by the next,
/// with no evidence that they could never have run concurrently.
#[derive(Debug, Clone)]
pub struct PotentialDeadlock {
    pub threads: Vec<DeadlockedThread>,
}

impl fmt::Display for PotentialDeadlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Potential deadlock among {} thread(s):", self.threads.len())?;
        for dt in &self.threads {
            let held = dt
                .held_locks
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                f,
                "  thread {} holds lock(s) [{held}] waiting for lock {}",
                dt.thread, dt.waiting_lock
            )?;
            write_location(f, "    held at", &dt.held_info)?;
            write_location(f, "    waiting at", &dt.waiting_info)?;
        }
        Ok(())
    }
}

fn write_location(f: &mut fmt::Formatter<'_>, label: &str, info: &LockDebugInfo) -> fmt::Result {
    if info.frames.is_empty() {
        writeln!(f, "{label}: no location information")
    } else {
        writeln!(f, "{label}:")?;
        for frame in &info.frames {
            writeln!(f, "      {}", frame.function_name)?;
        }
        Ok(())
    }
}

pub struct DeadlockAnalyzer<'a> {
    lock_graph: &'a LockGraph,
    segments: &'a SegmentationGraph,
}

impl<'a> DeadlockAnalyzer<'a> {
    pub fn new(lock_graph: &'a LockGraph, segments: &'a SegmentationGraph) -> Self {
        DeadlockAnalyzer {
            lock_graph,
            segments,
        }
    }

    /// Every potential deadlock in the lock graph, each simple cycle
    /// reported at most once.
    pub fn find(&self) -> Vec<PotentialDeadlock> {
        let cycles = cycle_engine::enumerate_cycles(self.lock_graph);
        let mut found: Vec<PotentialDeadlock> = Vec::new();

        for cycle in &cycles {
            if !self.is_genuine_deadlock(cycle) {
                continue;
            }
            let candidate = to_potential_deadlock(self.lock_graph, cycle);
            if !found
                .iter()
                .any(|existing| is_cyclic_permutation(&existing.threads, &candidate.threads))
            {
                found.push(candidate);
            }
        }

        found
    }

    /// A cycle is a genuine potential deadlock only if, for every ordered
    /// pair of its edges, the three pairwise predicates all hold.
    fn is_genuine_deadlock(&self, cycle: &Cycle) -> bool {
        let edges = &cycle.edges;
        for (i, ei) in edges.iter().enumerate() {
            for (j, ej) in edges.iter().enumerate() {
                if i == j {
                    continue;
                }
                if !self.pairwise_survives(ei, ej) {
                    return false;
                }
            }
        }
        true
    }

    fn pairwise_survives(&self, ei: &EdgeRef, ej: &EdgeRef) -> bool {
        if ei.label.thread == ej.label.thread {
            return false;
        }
        if ei.label.gatelocks.intersects(&ej.label.gatelocks) {
            return false;
        }
        if self.segments.happens_before(ei.label.s2, ej.label.s1) {
            return false;
        }
        true
    }
}

fn to_potential_deadlock(graph: &LockGraph, cycle: &Cycle) -> PotentialDeadlock {
    let threads = cycle
        .edges
        .iter()
        .map(|edge| {
            let source = graph.lock_at(edge.from);
            let mut held_locks = vec![source];
            held_locks.extend(edge.label.gatelocks.iter().copied().filter(|l| *l != source));
            DeadlockedThread {
                thread: edge.label.thread,
                held_locks,
                waiting_lock: graph.lock_at(edge.to),
                held_info: edge.label.l1_info.clone(),
                waiting_info: edge.label.l2_info.clone(),
            }
        })
        .collect();
    PotentialDeadlock { threads }
}

/// Whether `a` and `b` describe the same cycle of threads, up to choice of
/// starting point (e.g. `[A, B, C]` and `[B, C, A]` are the same cycle).
pub fn is_cyclic_permutation(a: &[DeadlockedThread], b: &[DeadlockedThread]) -> bool {
    if a.len() != b.len() || a.is_empty() {
        return a.len() == b.len();
    }
    let n = a.len();
    (0..n).any(|offset| {
        (0..n).all(|i| {
            let x = &a[i];
            let y = &b[(i + offset) % n];
            x.thread == y.thread
                && x.source_lock() == y.source_lock()
                && x.waiting_lock == y.waiting_lock
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{Acquire, ProcessEvent, Release, ThreadEvent};
    use crate::core::types::{LockDebugInfo, Segment};

    fn acquire(thread: usize, lock: usize) -> ThreadEvent {
        ThreadEvent::Acquire(Acquire {
            thread: ThreadId(thread),
            lock: LockId(lock),
            debug_info: LockDebugInfo::empty(),
        })
    }

    fn release(thread: usize, lock: usize) -> ThreadEvent {
        ThreadEvent::Release(Release {
            thread: ThreadId(thread),
            lock: LockId(lock),
        })
    }

    #[test]
    fn classic_ab_ba_deadlock_is_reported() {
        let t0 = vec![acquire(0, 1), acquire(0, 2), release(0, 2), release(0, 1)];
        let t1 = vec![acquire(1, 2), acquire(1, 1), release(1, 1), release(1, 2)];
        let lock_graph = LockGraph::build(&[(ThreadId(0), t0), (ThreadId(1), t1)]).unwrap();
        let segments = SegmentationGraph::build(&[]).unwrap();

        let found = DeadlockAnalyzer::new(&lock_graph, &segments).find();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].threads.len(), 2);
        for dt in &found[0].threads {
            assert_eq!(dt.held_locks, vec![dt.source_lock()]);
        }
    }

    #[test]
    fn same_thread_on_both_edges_is_not_a_deadlock() {
        // One thread acquiring 1 then 2 then, later, 2 then 1 again: the
        // same-thread edges are never concurrent with themselves.
        let t0 = vec![
            acquire(0, 1),
            acquire(0, 2),
            release(0, 2),
            release(0, 1),
            acquire(0, 2),
            acquire(0, 1),
            release(0, 1),
            release(0, 2),
        ];
        let lock_graph = LockGraph::build(&[(ThreadId(0), t0)]).unwrap();
        let segments = SegmentationGraph::build(&[]).unwrap();
        let found = DeadlockAnalyzer::new(&lock_graph, &segments).find();
        assert!(found.is_empty());
    }

    #[test]
    fn shared_gatelock_rules_out_the_cycle() {
        // Both threads hold lock 3 while racing for 1/2: they can never be
        // concurrent, since lock 3 serializes them.
        let t0 = vec![
            acquire(0, 3),
            acquire(0, 1),
            acquire(0, 2),
            release(0, 2),
            release(0, 1),
            release(0, 3),
        ];
        let t1 = vec![
            acquire(1, 3),
            acquire(1, 2),
            acquire(1, 1),
            release(1, 1),
            release(1, 2),
            release(1, 3),
        ];
        let lock_graph = LockGraph::build(&[(ThreadId(0), t0), (ThreadId(1), t1)]).unwrap();
        let segments = SegmentationGraph::build(&[]).unwrap();
        let found = DeadlockAnalyzer::new(&lock_graph, &segments).find();
        assert!(found.is_empty());
    }

    #[test]
    fn happens_before_rules_out_the_cycle() {
        let t0 = vec![acquire(0, 1), acquire(0, 2), release(0, 2), release(0, 1)];
        let t1 = vec![
            ThreadEvent::SegmentHop(crate::core::events::SegmentHop {
                thread: ThreadId(1),
                new_segment: Segment(1),
            }),
            acquire(1, 2),
            acquire(1, 1),
            release(1, 1),
            release(1, 2),
        ];
        let lock_graph = LockGraph::build(&[(ThreadId(0), t0), (ThreadId(1), t1)]).unwrap();

        // Thread 0's edge is entirely in segment 0; thread 1 hops into
        // segment 1 before acquiring anything, and segment 0 happens-before
        // segment 1 — so thread 0's acquisitions can never be concurrent
        // with thread 1's.
        let segments = SegmentationGraph::build(&[ProcessEvent::Start(
            crate::core::events::Start {
                parent_segment: Segment(0),
                new_parent_segment: Segment(1),
                child_segment: Segment(2),
            },
        )])
        .unwrap();

        let found = DeadlockAnalyzer::new(&lock_graph, &segments).find();
        assert!(found.is_empty());
    }

    #[test]
    fn is_cyclic_permutation_ignores_rotation() {
        let a = vec![
            DeadlockedThread {
                thread: ThreadId(0),
                held_locks: vec![LockId(1)],
                waiting_lock: LockId(2),
                held_info: LockDebugInfo::empty(),
                waiting_info: LockDebugInfo::empty(),
            },
            DeadlockedThread {
                thread: ThreadId(1),
                held_locks: vec![LockId(2)],
                waiting_lock: LockId(1),
                held_info: LockDebugInfo::empty(),
                waiting_info: LockDebugInfo::empty(),
            },
        ];
        let b = vec![a[1].clone(), a[0].clone()];
        assert!(is_cyclic_permutation(&a, &b));
    }
}
