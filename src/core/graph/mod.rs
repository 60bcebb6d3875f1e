//! The two graphs the analyzer is built from: a [`SegmentationGraph`]
//! encoding happens-before, and a [`LockGraph`] encoding lock-ordering.

pub mod lock_graph;
pub mod segmentation_graph;

pub use lock_graph::{EdgeLabel, EdgeRef, LockGraph};
pub use segmentation_graph::SegmentationGraph;
