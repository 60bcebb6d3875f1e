//! # Synctrace
//!
//! A post-mortem deadlock detector: instrument a multithreaded program with
//! [`Framework`] to record its lock acquisitions and releases to disk, then
//! replay that recording offline with [`Skeleton`] to find every potential
//! deadlock cycle the run could have hit.
//!
//! Unlike a real-time detector, synctrace never blocks or influences the
//! instrumented program beyond appending to its own event files; the
//! analysis itself runs later, against the recorded log.
//!
//! ## Usage Example
//!
//! ```no_run
//! use synctrace::Recorder;
//!
//! Recorder::new()
//!     .with_repository("/tmp/my-run")
//!     .start()
//!     .expect("failed to start recording");
//!
//! // ... run instrumented code, calling synctrace::framework() at each
//! // lock event ...
//!
//! synctrace::framework().unset_repository();
//!
//! let skeleton = synctrace::Skeleton::load("/tmp/my-run").unwrap();
//! for deadlock in skeleton.deadlocks() {
//!     println!("{deadlock}");
//! }
//! ```

mod core;
pub mod error;

pub use crate::core::{
    framework, new_lock_id, DeadlockAnalyzer, DeadlockedThread, Framework, Gatelocks,
    LockDebugInfo, LockId, PotentialDeadlock, Recorder, Segment, Skeleton, StackFrame, ThreadId,
};
pub use error::{CoreError, CoreResult};

#[cfg(feature = "ffi")]
pub mod ffi;

const BANNER: &str = r#"
      ▄▖▖ ▖▖▄▖▄▖▄▖▄▖▄▖▄▖
      ▚ ▌▌▛▌▌ ▐ ▙▘▌▌▌ █▌
      ▄▌▙▘▌▌▙▖▐ ▌▌▙▌▙▖▙▖
"#;
