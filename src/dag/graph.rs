// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::errors::{DojobberError, Result};
use crate::job::JobRegistry;
use crate::types::JobName;

/// Internal node structure: stores immediate deps.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Direct dependencies, in declared order.
    deps: Vec<JobName>,
}

/// Dependency graph reachable from one root job.
///
/// Edges point from a job to its dependency. Built once by [`JobGraph::build`]
/// and never mutated afterwards; construction fails if the edges contain a
/// cycle.
#[derive(Debug, Clone)]
pub struct JobGraph {
    root: JobName,
    /// Node names in registration order (root first).
    order: Vec<JobName>,
    nodes: HashMap<JobName, DagNode>,
}

impl JobGraph {
    /// Walk the declared dependencies reachable from `root` and build the
    /// graph.
    ///
    /// A job reachable via several paths is registered once. Fails with
    /// [`DojobberError::JobNotFound`] for an unknown root or dependency and
    /// [`DojobberError::DagCycle`] if the result is not acyclic.
    pub fn build(registry: &JobRegistry, root: &str) -> Result<Self> {
        if !registry.contains(root) {
            return Err(DojobberError::JobNotFound(root.to_string()));
        }

        let mut graph = Self {
            root: root.to_string(),
            order: Vec::new(),
            nodes: HashMap::new(),
        };
        graph.register(registry, root)?;
        graph.ensure_acyclic()?;

        debug!(
            root = %graph.root,
            nodes = graph.order.len(),
            "built job graph"
        );
        Ok(graph)
    }

    fn register(&mut self, registry: &JobRegistry, name: &str) -> Result<()> {
        if self.nodes.contains_key(name) {
            return Ok(());
        }
        let def = registry
            .get(name)
            .ok_or_else(|| DojobberError::JobNotFound(name.to_string()))?;

        // Insert before recursing so that a cycle terminates the walk.
        self.nodes.insert(name.to_string(), DagNode::default());
        self.order.push(name.to_string());

        for dep in def.deps() {
            if !registry.contains(dep) {
                debug!(job = %name, dependency = %dep, "unknown dependency");
                return Err(DojobberError::JobNotFound(dep.to_string()));
            }
            self.register(registry, dep)?;
        }

        if let Some(node) = self.nodes.get_mut(name) {
            node.deps = def.deps().to_vec();
        }
        Ok(())
    }

    fn ensure_acyclic(&self) -> Result<()> {
        if let Some((name, _)) = self.edges().find(|(from, to)| from == to) {
            return Err(DojobberError::DagCycle(format!(
                "programmer error: job graph contains a cycle: {name} -> {name}"
            )));
        }

        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in &self.order {
            graph.add_node(name.as_str());
        }
        for (from, to) in self.edges() {
            graph.add_edge(from, to, ());
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => {
                let path = describe_cycle(&graph, cycle.node_id());
                Err(DojobberError::DagCycle(format!(
                    "programmer error: job graph contains a cycle: {}",
                    path.join(" -> ")
                )))
            }
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Job names in registration order.
    pub fn jobs(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// All `(job, dependency)` edges, grouped by job in registration order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order.iter().flat_map(move |name| {
            self.dependencies_of(name)
                .iter()
                .map(move |dep| (name.as_str(), dep.as_str()))
        })
    }

    /// Immediate dependencies of a job, in declared order.
    pub fn dependencies_of(&self, name: &str) -> &[JobName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Depth-first post-order of the subgraph reachable from `start`:
    /// every dependency precedes its dependents and `start` comes last.
    /// Empty if `start` is not part of the graph.
    pub fn post_order(&self, start: &str) -> Vec<JobName> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        if self.contains(start) {
            self.post_order_into(start, &mut seen, &mut out);
        }
        out
    }

    fn post_order_into(&self, name: &str, seen: &mut HashSet<JobName>, out: &mut Vec<JobName>) {
        if !seen.insert(name.to_string()) {
            return;
        }
        for dep in self.dependencies_of(name) {
            self.post_order_into(dep, seen, out);
        }
        out.push(name.to_string());
    }
}

/// Recover a concrete cycle through `start` for the error message.
///
/// Every node of a strongly connected component has an edge to another node
/// of the same component, so following those edges must revisit a node.
fn describe_cycle<'a>(graph: &DiGraphMap<&'a str, ()>, start: &'a str) -> Vec<&'a str> {
    let component: HashSet<&str> = tarjan_scc(graph)
        .into_iter()
        .find(|scc| scc.contains(&start))
        .map(|scc| scc.into_iter().collect())
        .unwrap_or_default();

    let mut path: Vec<&str> = vec![start];
    let mut current = start;
    loop {
        let next = graph
            .neighbors(current)
            .find(|n| component.contains(n) && (component.len() > 1 || *n == current));
        let Some(next) = next else {
            return path;
        };
        if let Some(pos) = path.iter().position(|p| *p == next) {
            let mut cycle = path.split_off(pos);
            cycle.push(next);
            return cycle;
        }
        path.push(next);
        current = next;
    }
}
