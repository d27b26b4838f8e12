// src/engine/observer.rs

//! Hook for attaching visual metadata to nodes as their status changes.

use crate::types::NodeMark;

/// Notified on every node status transition of a run.
///
/// This is the only hook the engine offers toward graph renderers; it must
/// not influence control flow.
pub trait NodeObserver: Send {
    fn node_marked(&mut self, job: &str, mark: NodeMark);
}

impl<F> NodeObserver for F
where
    F: FnMut(&str, NodeMark) + Send,
{
    fn node_marked(&mut self, job: &str, mark: NodeMark) {
        self(job, mark)
    }
}
