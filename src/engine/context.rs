// src/engine/context.rs

//! Per-run state: storage scopes, result maps and live job instances.

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::PathBuf;

use serde_json::Value;

use crate::errors::JobError;
use crate::job::{Job, JobArgs, JobContext, PhaseRecord, Storage};
use crate::types::{JobName, NodeMark, NodeStatus, Phase};

/// One constructed job of the current run.
///
/// Owns the job object and its private storage; the run-shared storage is
/// lent in for each call.
pub struct JobInstance {
    name: JobName,
    job: Box<dyn Job>,
    storage: Storage,
    record: PhaseRecord,
    phase: Option<Phase>,
}

impl JobInstance {
    pub fn new(name: impl Into<JobName>, job: Box<dyn Job>) -> Self {
        Self {
            name: name.into(),
            job,
            storage: Storage::new(),
            record: PhaseRecord::default(),
            phase: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Phase of the most recent call, `None` before the first one.
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn record(&self) -> &PhaseRecord {
        &self.record
    }

    /// Invoke the job method for `phase` and record its outcome.
    pub fn call(
        &mut self,
        phase: Phase,
        args: &JobArgs,
        shared: &mut Storage,
    ) -> Result<Value, JobError> {
        self.phase = Some(phase);

        let mut ctx = JobContext::new(
            &self.name,
            phase,
            args,
            &mut self.storage,
            shared,
            &self.record,
        );
        let outcome = match phase {
            Phase::Check | Phase::Recheck => self.job.check(&mut ctx),
            Phase::Run => self.job.run(&mut ctx),
            Phase::Cleanup => self.job.cleanup(&mut ctx).map(|()| Value::Null),
        }
        .map_err(JobError::from);

        let slot = match phase {
            Phase::Check => &mut self.record.check,
            Phase::Run => &mut self.record.run,
            Phase::Recheck => &mut self.record.recheck,
            Phase::Cleanup => return outcome,
        };
        *slot = Some(outcome.clone());
        outcome
    }
}

/// Mutable state of one `checknrun` invocation.
///
/// Created fresh at the start of every run. The result maps stay queryable
/// after the run; instances are kept until cleaned up.
#[derive(Default)]
pub struct RunContext {
    cwd: Option<PathBuf>,
    pub(crate) shared: Storage,
    pub(crate) statuses: BTreeMap<JobName, NodeStatus>,
    pub(crate) marks: BTreeMap<JobName, NodeMark>,
    pub(crate) exceptions: BTreeMap<JobName, JobError>,
    pub(crate) run_exceptions: BTreeMap<JobName, JobError>,
    pub(crate) results: BTreeMap<JobName, Value>,
    /// Instantiated jobs, in instantiation order.
    pub(crate) instances: Vec<JobInstance>,
    pub(crate) visited: HashSet<JobName>,
}

impl RunContext {
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd: Some(cwd),
            ..Self::default()
        }
    }

    /// Working directory captured when the run started.
    pub fn cwd(&self) -> Option<&PathBuf> {
        self.cwd.as_ref()
    }

    /// Change back to the captured working directory.
    pub fn restore_cwd(&self) -> io::Result<()> {
        match &self.cwd {
            Some(cwd) => std::env::set_current_dir(cwd),
            None => Ok(()),
        }
    }

    pub fn status(&self, job: &str) -> Option<NodeStatus> {
        self.statuses.get(job).copied()
    }

    pub fn shared(&self) -> &Storage {
        &self.shared
    }

    /// Names of jobs instantiated in this run that still await cleanup.
    pub fn instantiated(&self) -> impl Iterator<Item = &str> {
        self.instances.iter().map(|i| i.name.as_str())
    }
}
