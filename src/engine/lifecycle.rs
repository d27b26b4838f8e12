// src/engine/lifecycle.rs

//! Per-node traversal and the check / run / recheck protocol.

use anyhow::Context;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::DoJobber;
use super::context::JobInstance;
use crate::errors::JobError;
use crate::types::{NodeMark, NodeStatus, Phase};

impl DoJobber {
    /// Resolve `job`'s dependencies, then attempt `job` unless one of them
    /// did not succeed.
    ///
    /// Each node is visited at most once per run.
    pub(crate) fn visit(&mut self, job: &str) {
        if !self.run.visited.insert(job.to_string()) {
            return;
        }

        let order = self
            .graph
            .as_ref()
            .map(|g| g.post_order(job))
            .unwrap_or_default();

        let mut blocked = false;
        for dep in order.iter().filter(|d| d.as_str() != job) {
            if !self.run.visited.contains(dep) {
                self.visit(dep);
            }
            if self.run.status(dep) != Some(NodeStatus::Succeeded) {
                blocked = true;
            }
        }

        // Persists if the node turns out to be blocked.
        self.node_untested(job);
        if blocked {
            debug!(job = %job, "dependencies did not all succeed; not attempted");
            return;
        }

        let instance = match self.instantiate(job) {
            Ok(instance) => instance,
            Err(err) => {
                self.log_phase(job, Phase::Check, Some(&err));
                self.node_failed(job, err);
                return;
            }
        };
        self.run.instances.push(instance);
        let idx = self.run.instances.len() - 1;

        self.check_run_recheck(job, idx);
    }

    fn instantiate(&self, job: &str) -> Result<JobInstance, JobError> {
        let def = self
            .registry
            .get(job)
            .ok_or_else(|| JobError::msg(format!("job '{job}' is not registered")))?;
        let object = def.instantiate().map_err(|err| {
            debug!(job = %job, error = %err, "constructor failed");
            JobError::from(err)
        })?;
        Ok(JobInstance::new(job, object))
    }

    fn check_run_recheck(&mut self, job: &str, idx: usize) {
        match self.call(idx, Phase::Check) {
            Ok(value) => {
                self.log_phase(job, Phase::Check, None);
                self.node_succeeded(job, value, NodeMark::Passed);
                return;
            }
            Err(err) => {
                self.log_phase(job, Phase::Check, Some(&err));
                if self.options.no_act {
                    // Verification only; never act.
                    self.node_failed(job, err);
                    return;
                }
            }
        }

        // A failed run is not fatal: the recheck has the final word.
        match self.call(idx, Phase::Run) {
            Ok(_) => self.log_phase(job, Phase::Run, None),
            Err(err) => {
                self.log_phase(job, Phase::Run, Some(&err));
                self.run.run_exceptions.insert(job.to_string(), err);
            }
        }

        match self.call(idx, Phase::Recheck) {
            Ok(value) => {
                self.log_phase(job, Phase::Recheck, None);
                self.node_succeeded(job, value, NodeMark::PassedAfterRun);
            }
            Err(err) => {
                self.log_phase(job, Phase::Recheck, Some(&err));
                self.node_failed(job, err);
            }
        }
    }

    fn call(&mut self, idx: usize, phase: Phase) -> Result<Value, JobError> {
        self.run
            .restore_cwd()
            .context("restoring working directory")
            .map_err(JobError::from)?;

        let instance = &mut self.run.instances[idx];
        instance.call(phase, &self.args, &mut self.run.shared)
    }

    fn node_untested(&mut self, job: &str) {
        self.set_mark(job, NodeMark::Untested);
    }

    fn node_succeeded(&mut self, job: &str, value: Value, mark: NodeMark) {
        self.run.results.insert(job.to_string(), value);
        self.set_mark(job, mark);
    }

    fn node_failed(&mut self, job: &str, err: JobError) {
        self.run.exceptions.insert(job.to_string(), err);
        self.set_mark(job, NodeMark::Failed);
    }

    fn set_mark(&mut self, job: &str, mark: NodeMark) {
        self.run.statuses.insert(job.to_string(), mark.status());
        self.run.marks.insert(job.to_string(), mark);
        for observer in self.observers.iter_mut() {
            observer.node_marked(job, mark);
        }
    }

    fn log_phase(&self, job: &str, phase: Phase, err: Option<&JobError>) {
        match (err, self.options.verbose) {
            (None, true) => info!(job = %job, %phase, "pass"),
            (None, false) => debug!(job = %job, %phase, "pass"),
            (Some(err), true) => info!(job = %job, %phase, error = %err, "fail"),
            (Some(err), false) => debug!(job = %job, %phase, error = %err, "fail"),
        }
        if let (Some(err), true) = (err, self.options.debug) {
            warn!(job = %job, %phase, "error was: {err:?}");
        }
    }
}
