//! The six synchronization event variants and their accessors.
//!
//! Each event is a plain struct with memberwise equality; the two enums
//! group them by where they're routed ([`ThreadEvent`] to a per-thread
//! file, [`ProcessEvent`] to the shared `process_wide` file — see
//! [`crate::core::store`]). Serialization is one `serde_json` object per
//! line, tagged with an explicit `"type"` field; an unrecognized tag is a
//! hard [`crate::error::CoreError::SerializationError`], never a silent
//! skip.

use crate::core::types::{LockDebugInfo, LockId, Segment, ThreadId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acquire {
    pub thread: ThreadId,
    pub lock: LockId,
    pub debug_info: LockDebugInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub thread: ThreadId,
    pub lock: LockId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecursiveAcquire {
    pub thread: ThreadId,
    pub lock: LockId,
    pub debug_info: LockDebugInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecursiveRelease {
    pub thread: ThreadId,
    pub lock: LockId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentHop {
    pub thread: ThreadId,
    pub new_segment: Segment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Start {
    pub parent_segment: Segment,
    pub new_parent_segment: Segment,
    pub child_segment: Segment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    pub parent_segment: Segment,
    pub new_parent_segment: Segment,
    pub child_segment: Segment,
}

/// Events specific to a single thread — routed to that thread's file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ThreadEvent {
    Acquire(Acquire),
    Release(Release),
    RecursiveAcquire(RecursiveAcquire),
    RecursiveRelease(RecursiveRelease),
    SegmentHop(SegmentHop),
}

impl ThreadEvent {
    pub fn variant_name(&self) -> &'static str {
        match self {
            ThreadEvent::Acquire(_) => "Acquire",
            ThreadEvent::Release(_) => "Release",
            ThreadEvent::RecursiveAcquire(_) => "RecursiveAcquire",
            ThreadEvent::RecursiveRelease(_) => "RecursiveRelease",
            ThreadEvent::SegmentHop(_) => "SegmentHop",
        }
    }

    pub fn thread_of(&self) -> ThreadId {
        match self {
            ThreadEvent::Acquire(e) => e.thread,
            ThreadEvent::Release(e) => e.thread,
            ThreadEvent::RecursiveAcquire(e) => e.thread,
            ThreadEvent::RecursiveRelease(e) => e.thread,
            ThreadEvent::SegmentHop(e) => e.thread,
        }
    }

    pub fn lock_of(&self) -> Option<LockId> {
        match self {
            ThreadEvent::Acquire(e) => Some(e.lock),
            ThreadEvent::Release(e) => Some(e.lock),
            ThreadEvent::RecursiveAcquire(e) => Some(e.lock),
            ThreadEvent::RecursiveRelease(e) => Some(e.lock),
            ThreadEvent::SegmentHop(_) => None,
        }
    }

    pub fn segment_of(&self) -> Option<Segment> {
        match self {
            ThreadEvent::SegmentHop(e) => Some(e.new_segment),
            _ => None,
        }
    }

    pub fn aux_info_of(&self) -> Option<&LockDebugInfo> {
        match self {
            ThreadEvent::Acquire(e) => Some(&e.debug_info),
            ThreadEvent::RecursiveAcquire(e) => Some(&e.debug_info),
            _ => None,
        }
    }
}

/// Events not specific to a single thread — routed to `process_wide`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProcessEvent {
    Start(Start),
    Join(Join),
}

impl ProcessEvent {
    pub fn variant_name(&self) -> &'static str {
        match self {
            ProcessEvent::Start(_) => "Start",
            ProcessEvent::Join(_) => "Join",
        }
    }

    pub fn parent_of(&self) -> Segment {
        match self {
            ProcessEvent::Start(e) => e.parent_segment,
            ProcessEvent::Join(e) => e.parent_segment,
        }
    }

    pub fn new_parent_of(&self) -> Segment {
        match self {
            ProcessEvent::Start(e) => e.new_parent_segment,
            ProcessEvent::Join(e) => e.new_parent_segment,
        }
    }

    pub fn child_of(&self) -> Segment {
        match self {
            ProcessEvent::Start(e) => e.child_segment,
            ProcessEvent::Join(e) => e.child_segment,
        }
    }
}

/// Serialize an event (or any serializable record) as one JSON line.
pub fn to_line<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

/// Deserialize a single JSON line previously produced by [`to_line`].
pub fn from_line<T: for<'de> Deserialize<'de>>(line: &str) -> serde_json::Result<T> {
    serde_json::from_str(line)
}
