//! Semantic identifiers shared by every other module: thread ids, lock ids,
//! segments, and the opaque call-stack payload attached to acquisitions.

use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Unique id identifying a thread in the analyzed program.
///
/// Minted by the instrumented program (or by its thread-wrapping
/// convenience layer, which is out of scope here) from a platform thread id
/// the first time an event for that thread is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub usize);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for ThreadId {
    fn from(id: usize) -> Self {
        ThreadId(id)
    }
}

/// Unique id representing a synchronization object in the analyzed program.
///
/// Identical contract to [`ThreadId`]; minted by [`crate::core::id_gen`] or
/// supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockId(pub usize);

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for LockId {
    fn from(id: usize) -> Self {
        LockId(id)
    }
}

/// A position in the per-process monotonic sequence of segments.
///
/// The distinguished zero segment, [`Segment::INITIAL`], is the segment
/// every thread is considered to be in before any `start`/`join` mints a
/// new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Segment(pub usize);

impl Segment {
    pub const INITIAL: Segment = Segment(0);
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single `(instruction_pointer, function_name, module_name)` frame of a
/// captured call stack.
///
/// Function and module names are best-effort: when symbol resolution isn't
/// available (it never is in this crate — see [`crate::core::call_stack`]),
/// placeholder strings are used instead, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    pub instruction_pointer: usize,
    pub function_name: String,
    pub module_name: String,
}

/// Opaque call-stack snapshot attached to every acquire event.
///
/// An empty sequence is valid and simply means no frames were captured.
/// Used only for diagnostic output and, incidentally, for edge distinctness
/// in the lock graph (two acquisitions with different debug info produce
/// distinct edges even between the same pair of locks).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockDebugInfo {
    pub frames: Vec<StackFrame>,
}

impl LockDebugInfo {
    pub fn empty() -> Self {
        LockDebugInfo { frames: Vec::new() }
    }
}

/// An unordered, cheaply shareable collection of [`LockId`]s.
///
/// Represents the locks a thread already held, excluding the edge's own
/// source and target lock, at the moment it acquired another lock. Several
/// lock-graph edges produced from the same acquisition context share the
/// same underlying allocation via [`Arc`]; equality is always set equality,
/// never pointer identity, so the sharing is never observable through the
/// public API.
#[derive(Debug, Clone, Default)]
pub struct Gatelocks(pub Arc<FxHashSet<LockId>>);

impl Gatelocks {
    pub fn new(locks: FxHashSet<LockId>) -> Self {
        Gatelocks(Arc::new(locks))
    }

    pub fn empty() -> Self {
        Gatelocks(Arc::new(FxHashSet::default()))
    }

    pub fn contains(&self, lock: &LockId) -> bool {
        self.0.contains(lock)
    }

    pub fn intersects(&self, other: &Gatelocks) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        if self.0.len() <= other.0.len() {
            self.0.iter().any(|l| other.0.contains(l))
        } else {
            other.0.iter().any(|l| self.0.contains(l))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &LockId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Gatelocks {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}
impl Eq for Gatelocks {}
