//! Pitch-class sets and the precomputed graph that relates them.
//!
//! The graph is consumed as static data. Only the walker's cursor moves.

pub mod pitch_class_set;
pub mod relation_graph;

pub use pitch_class_set::PitchClassSet;
pub use relation_graph::{GraphData, GraphDataset, RelationGraph};
