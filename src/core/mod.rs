//! Core machinery: instrumentation entry points, event persistence, and the
//! offline analysis that turns a recorded run into potential deadlocks.

pub mod analyzer;
pub mod call_stack;
pub mod cycle_engine;
pub mod events;
pub mod framework;
pub mod graph;
pub mod id_gen;
pub mod skeleton;
pub mod store;
pub mod types;

pub use analyzer::{DeadlockAnalyzer, DeadlockedThread, PotentialDeadlock};
pub use framework::{framework, Framework, Recorder};
pub use id_gen::new_lock_id;
pub use skeleton::Skeleton;
pub use types::{Gatelocks, LockDebugInfo, LockId, Segment, StackFrame, ThreadId};
