// src/engine/mod.rs

//! Orchestration engine.
//!
//! [`DoJobber`] owns the job registry and the graph built for the configured
//! root. Each `checknrun` creates a fresh [`RunContext`] and walks the graph:
//!
//! - [`lifecycle`] visits nodes in dependency order and runs the
//!   check / run / recheck protocol on every unblocked node.
//! - [`cleanup`] tears down instantiated jobs in reverse order.
//! - [`outcome`] aggregates the status map into success / partial success.
//! - [`observer`] lets a renderer follow status transitions.

pub mod cleanup;
pub mod context;
pub mod lifecycle;
pub mod observer;
pub mod outcome;

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info};

use crate::dag::{GraphView, JobGraph};
use crate::errors::{DojobberError, JobError, Result};
use crate::job::{JobArgs, JobRegistry, Storage};
use crate::types::{JobName, NodeMark, NodeStatus};

pub use context::{JobInstance, RunContext};
pub use observer::NodeObserver;
pub use outcome::OutcomeSummary;

/// Run-mode switches set by [`DoJobber::configure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobberOptions {
    /// Only verify: `run` is never called and a failed check fails the node.
    pub no_act: bool,
    /// Log one line per check / run / recheck at `info`.
    pub verbose: bool,
    /// Additionally log full error chains. Implies `verbose`.
    pub debug: bool,
    /// Run cleanup automatically at the end of `checknrun`.
    pub cleanup: bool,
}

impl Default for JobberOptions {
    fn default() -> Self {
        Self {
            no_act: false,
            verbose: false,
            debug: false,
            cleanup: true,
        }
    }
}

impl JobberOptions {
    pub fn with_no_act(mut self, no_act: bool) -> Self {
        self.no_act = no_act;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }
}

/// Dependency-graph job orchestrator.
///
/// ```no_run
/// use dojobber::{DoJobber, JobDefinition, JobRegistry, JobberOptions};
///
/// let mut registry = JobRegistry::new();
/// registry.register(JobDefinition::noop("Deploy").after("Install"))?;
/// registry.register(JobDefinition::noop("Install"))?;
///
/// let mut jobber = DoJobber::new(registry);
/// jobber.configure("Deploy", JobberOptions::default())?;
/// jobber.checknrun()?;
/// assert!(jobber.success());
/// # Ok::<(), dojobber::DojobberError>(())
/// ```
pub struct DoJobber {
    registry: JobRegistry,
    graph: Option<JobGraph>,
    options: JobberOptions,
    args: JobArgs,
    run: RunContext,
    observers: Vec<Box<dyn NodeObserver>>,
}

impl DoJobber {
    pub fn new(registry: JobRegistry) -> Self {
        Self {
            registry,
            graph: None,
            options: JobberOptions::default(),
            args: JobArgs::default(),
            run: RunContext::default(),
            observers: Vec::new(),
        }
    }

    /// Select the root job, build its graph and set the run mode.
    ///
    /// Fails on unknown jobs and on dependency cycles.
    pub fn configure(&mut self, root: &str, mut options: JobberOptions) -> Result<()> {
        options.verbose |= options.debug;
        let graph = JobGraph::build(&self.registry, root)?;
        info!(
            root = %root,
            jobs = graph.len(),
            no_act = options.no_act,
            cleanup = options.cleanup,
            "configured job graph"
        );
        self.graph = Some(graph);
        self.options = options;
        Ok(())
    }

    /// Arguments forwarded to every `check` / `run` call.
    pub fn set_args(&mut self, args: JobArgs) {
        self.args = args;
    }

    pub fn add_observer(&mut self, observer: impl NodeObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn options(&self) -> JobberOptions {
        self.options
    }

    pub fn args(&self) -> &JobArgs {
        &self.args
    }

    /// Check and run the whole graph from the configured root.
    pub fn checknrun(&mut self) -> Result<()> {
        let root = self
            .graph
            .as_ref()
            .ok_or(DojobberError::NotConfigured)?
            .root()
            .to_string();
        self.checknrun_from(&root)
    }

    /// Check and run the subgraph rooted at `job`.
    ///
    /// The working directory is captured first and restored before every
    /// job call and on return. Only cleanup failures and I/O errors on the
    /// working directory are returned; job failures end up in the status
    /// and exception maps.
    pub fn checknrun_from(&mut self, job: &str) -> Result<()> {
        let graph = self.graph.as_ref().ok_or(DojobberError::NotConfigured)?;
        if !graph.contains(job) {
            return Err(DojobberError::JobNotFound(job.to_string()));
        }

        let cwd = std::env::current_dir()?;
        debug!(cwd = %cwd.display(), "captured working directory");
        self.run = RunContext::new(cwd);

        info!(job = %job, no_act = self.options.no_act, "checknrun starting");
        self.visit(job);
        self.run.restore_cwd()?;

        let summary = self.summary();
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            unattempted = summary.unattempted,
            "checknrun finished"
        );

        if self.options.cleanup {
            self.cleanup()?;
        }
        Ok(())
    }

    /// Final status of every node reached by the last run.
    pub fn statuses(&self) -> &BTreeMap<JobName, NodeStatus> {
        &self.run.statuses
    }

    pub fn status(&self, job: &str) -> Option<NodeStatus> {
        self.run.status(job)
    }

    /// Errors of failed nodes.
    pub fn exceptions(&self) -> &BTreeMap<JobName, JobError> {
        &self.run.exceptions
    }

    pub fn exception(&self, job: &str) -> Option<&JobError> {
        self.run.exceptions.get(job)
    }

    /// Errors raised by `run`, kept for diagnostics. The recheck decides
    /// the node outcome, so an entry here does not imply failure.
    pub fn run_exceptions(&self) -> &BTreeMap<JobName, JobError> {
        &self.run.run_exceptions
    }

    /// Values returned by the deciding check of succeeded nodes.
    pub fn results(&self) -> &BTreeMap<JobName, Value> {
        &self.run.results
    }

    pub fn result(&self, job: &str) -> Option<&Value> {
        self.run.results.get(job)
    }

    pub fn marks(&self) -> &BTreeMap<JobName, NodeMark> {
        &self.run.marks
    }

    /// Storage shared by all jobs of the last run.
    pub fn shared_storage(&self) -> &Storage {
        self.run.shared()
    }

    /// State of the current (or last) run.
    pub fn run_context(&self) -> &RunContext {
        &self.run
    }

    pub fn success(&self) -> bool {
        outcome::success(&self.run.statuses)
    }

    pub fn partial_success(&self) -> bool {
        outcome::partial_success(&self.run.statuses)
    }

    pub fn failure(&self) -> bool {
        !self.success()
    }

    pub fn summary(&self) -> OutcomeSummary {
        OutcomeSummary::from_statuses(&self.run.statuses)
    }

    /// Snapshot of the graph with per-node state, for renderers.
    pub fn graph_view(&self) -> Option<GraphView> {
        self.graph
            .as_ref()
            .map(|graph| GraphView::new(graph, &self.run.marks))
    }
}

impl std::fmt::Debug for DoJobber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoJobber")
            .field("root", &self.graph.as_ref().map(|g| g.root()))
            .field("options", &self.options)
            .field("statuses", &self.run.statuses)
            .finish_non_exhaustive()
    }
}
