// src/dag/view.rs

//! Read-only export of the graph and per-node state for external renderers.
//!
//! The crate never draws anything itself; a renderer can walk a
//! [`GraphView`] or serialise it (it derives `Serialize`).

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dag::JobGraph;
use crate::types::{JobName, NodeMark, NodeStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView {
    pub name: JobName,
    pub status: NodeStatus,
    pub mark: NodeMark,
    /// Colour hint derived from `mark`.
    pub color: Option<&'static str>,
}

/// Edge from a job to one of its dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeView {
    pub job: JobName,
    pub dependency: JobName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphView {
    pub root: JobName,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

impl GraphView {
    /// Snapshot `graph` with the given marks. Nodes without a mark are
    /// reported as untested.
    pub fn new(graph: &JobGraph, marks: &BTreeMap<JobName, NodeMark>) -> Self {
        let nodes = graph
            .jobs()
            .map(|name| {
                let mark = marks.get(name).copied().unwrap_or(NodeMark::Untested);
                NodeView {
                    name: name.to_string(),
                    status: mark.status(),
                    mark,
                    color: mark.color(),
                }
            })
            .collect();

        let edges = graph
            .edges()
            .map(|(job, dep)| EdgeView {
                job: job.to_string(),
                dependency: dep.to_string(),
            })
            .collect();

        Self {
            root: graph.root().to_string(),
            nodes,
            edges,
        }
    }

    pub fn node(&self, name: &str) -> Option<&NodeView> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobDefinition, JobRegistry};

    #[test]
    fn view_carries_marks_and_colors() {
        let mut reg = JobRegistry::new();
        reg.register(JobDefinition::noop("A").after("B")).unwrap();
        reg.register(JobDefinition::noop("B")).unwrap();
        let graph = JobGraph::build(&reg, "A").unwrap();

        let mut marks = BTreeMap::new();
        marks.insert("B".to_string(), NodeMark::PassedAfterRun);
        let view = GraphView::new(&graph, &marks);

        assert_eq!(view.root, "A");
        assert_eq!(view.node("B").unwrap().color, Some("darkgreen"));
        assert_eq!(view.node("B").unwrap().status, NodeStatus::Succeeded);
        assert_eq!(view.node("A").unwrap().mark, NodeMark::Untested);
        assert_eq!(
            view.edges,
            vec![EdgeView {
                job: "A".into(),
                dependency: "B".into()
            }]
        );

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["nodes"][1]["mark"], "passed-after-run");
    }
}
