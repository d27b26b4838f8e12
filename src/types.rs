use std::fmt;

use serde::Serialize;

/// Canonical job name type used throughout the crate.
pub type JobName = String;

/// Key under which the run-shared storage lives, distinct from every job name.
pub const SHARED_STORAGE_KEY: &str = "__global";

/// Final per-node state of a run.
///
/// `Unattempted` covers both nodes blocked by a dependency and nodes that
/// have not been reached yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Unattempted,
    Succeeded,
    Failed,
}

impl NodeStatus {
    pub fn is_success(self) -> bool {
        matches!(self, NodeStatus::Succeeded)
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::Unattempted => write!(f, "unattempted"),
            NodeStatus::Succeeded => write!(f, "succeeded"),
            NodeStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Visual metadata attached to a node on every status transition.
///
/// Distinguishes a node that passed its first check from one that only
/// passed after its Run, which `NodeStatus` deliberately does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeMark {
    Untested,
    Passed,
    PassedAfterRun,
    Failed,
}

impl NodeMark {
    /// Fill colour hint for graph renderers.
    pub fn color(self) -> Option<&'static str> {
        match self {
            NodeMark::Untested => None,
            NodeMark::Passed => Some("green"),
            NodeMark::PassedAfterRun => Some("darkgreen"),
            NodeMark::Failed => Some("red"),
        }
    }

    pub fn status(self) -> NodeStatus {
        match self {
            NodeMark::Untested => NodeStatus::Unattempted,
            NodeMark::Passed | NodeMark::PassedAfterRun => NodeStatus::Succeeded,
            NodeMark::Failed => NodeStatus::Failed,
        }
    }
}

/// Which step of a job's lifecycle is currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Check,
    Run,
    Recheck,
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Check => write!(f, "check"),
            Phase::Run => write!(f, "run"),
            Phase::Recheck => write!(f, "recheck"),
            Phase::Cleanup => write!(f, "cleanup"),
        }
    }
}
