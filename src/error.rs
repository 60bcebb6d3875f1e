//! Structured error type for the library. Hot-path `notify_*` entry points
//! never surface these to the mutator (see [`crate::core::framework`]);
//! they exist for store construction and for the analyzer.

use crate::core::types::{LockId, ThreadId};
use thiserror::Error;

/// Every way the analyzer or the on-disk store can fail.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The repository path existed and was neither empty nor a directory,
    /// or existed as a non-empty directory when a fresh store was expected.
    #[error("invalid repository path: {0}")]
    InvalidRepositoryPath(String),

    /// An event of the wrong variant was encountered in a context that
    /// requires a specific one (e.g. the first process-wide event must be
    /// a `Start`).
    #[error("expected event of type `{expected}`, found `{actual}`")]
    EventType {
        expected: &'static str,
        actual: &'static str,
    },

    /// A thread-scoped event's embedded thread id disagreed with the file
    /// it was read from.
    #[error("event for thread {event_thread} found in file for thread {file_thread}")]
    EventThread {
        file_thread: ThreadId,
        event_thread: ThreadId,
    },

    /// `Release`/`RecursiveRelease` for a lock the releasing thread did not
    /// hold.
    #[error("thread {thread} released lock {lock} it did not hold")]
    UnexpectedRelease { thread: ThreadId, lock: LockId },

    /// The per-thread recursive-acquire counter for a lock saturated.
    #[error("recursive lock counter overflowed for lock {0}")]
    RecursiveLockOverflow(LockId),

    /// A record in the event stream could not be decoded.
    #[error("malformed event record: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Filesystem failure while constructing or reading a store.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
