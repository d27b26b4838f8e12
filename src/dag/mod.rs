// src/dag/mod.rs

//! Job dependency graph.
//!
//! - [`graph`] builds the immutable, acyclic graph reachable from a root job
//!   and provides the depth-first post-order used by the engine.
//! - [`view`] exports names, edges and per-node state for renderers.

pub mod graph;
pub mod view;

pub use graph::JobGraph;
pub use view::{EdgeView, GraphView, NodeView};
