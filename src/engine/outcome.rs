// src/engine/outcome.rs

//! Derive overall run outcome from the per-node status map.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{JobName, NodeStatus};

/// True iff at least one node was recorded and every node succeeded.
pub fn success(statuses: &BTreeMap<JobName, NodeStatus>) -> bool {
    !statuses.is_empty() && statuses.values().all(|s| s.is_success())
}

/// True iff at least one node succeeded. Unattempted nodes count as
/// neither success nor failure here.
pub fn partial_success(statuses: &BTreeMap<JobName, NodeStatus>) -> bool {
    statuses.values().any(|s| s.is_success())
}

/// Per-status node counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub unattempted: usize,
}

impl OutcomeSummary {
    pub fn from_statuses(statuses: &BTreeMap<JobName, NodeStatus>) -> Self {
        let mut summary = Self::default();
        for status in statuses.values() {
            match status {
                NodeStatus::Succeeded => summary.succeeded += 1,
                NodeStatus::Failed => summary.failed += 1,
                NodeStatus::Unattempted => summary.unattempted += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.unattempted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses(entries: &[(&str, NodeStatus)]) -> BTreeMap<JobName, NodeStatus> {
        entries
            .iter()
            .map(|(name, status)| (name.to_string(), *status))
            .collect()
    }

    #[test]
    fn empty_run_is_neither_success_nor_partial() {
        let empty = statuses(&[]);
        assert!(!success(&empty));
        assert!(!partial_success(&empty));
    }

    #[test]
    fn all_succeeded() {
        let s = statuses(&[("A", NodeStatus::Succeeded), ("B", NodeStatus::Succeeded)]);
        assert!(success(&s));
        assert!(partial_success(&s));
    }

    #[test]
    fn blocked_node_spoils_success_only() {
        let s = statuses(&[("A", NodeStatus::Unattempted), ("B", NodeStatus::Succeeded)]);
        assert!(!success(&s));
        assert!(partial_success(&s));
    }

    #[test]
    fn failure_and_block_without_any_success() {
        let s = statuses(&[("A", NodeStatus::Unattempted), ("B", NodeStatus::Failed)]);
        assert!(!success(&s));
        assert!(!partial_success(&s));

        let summary = OutcomeSummary::from_statuses(&s);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.unattempted, 1);
        assert_eq!(summary.total(), 2);
    }
}
