#![allow(dead_code)]

use dojobber::{JobDefinition, JobRegistry};

use crate::jobs::{CallLog, CheckBehaviour, ScriptedJob};

/// Builder for a `JobRegistry` of scripted jobs sharing one call log.
pub struct RegistryBuilder {
    registry: JobRegistry,
    log: CallLog,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            registry: JobRegistry::new(),
            log: CallLog::new(),
        }
    }

    /// Log shared by every job added through this builder.
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    /// Add a scripted job; `configure` can adjust run/cleanup outcomes.
    pub fn job_with<F>(
        mut self,
        name: &str,
        check: CheckBehaviour,
        deps: &[&str],
        configure: F,
    ) -> Self
    where
        F: Fn(ScriptedJob) -> ScriptedJob + Send + Sync + 'static,
    {
        let job = configure(ScriptedJob::new(name, check, self.log.clone()));
        let def = JobDefinition::new(name, move || Ok(job.clone()))
            .after_all(deps.iter().copied());
        self.registry
            .register(def)
            .expect("Failed to register scripted job");
        self
    }

    pub fn job(self, name: &str, check: CheckBehaviour, deps: &[&str]) -> Self {
        self.job_with(name, check, deps, |job| job)
    }

    /// Add a job whose constructor always fails.
    pub fn broken(mut self, name: &str, deps: &[&str]) -> Self {
        let message = format!("{name} cannot be constructed");
        let def = JobDefinition::new(name, move || -> anyhow::Result<ScriptedJob> {
            anyhow::bail!("{}", message)
        })
        .after_all(deps.iter().copied());
        self.registry
            .register(def)
            .expect("Failed to register broken job");
        self
    }

    /// Add any other definition.
    pub fn definition(mut self, def: JobDefinition) -> Self {
        self.registry
            .register(def)
            .expect("Failed to register job definition");
        self
    }

    pub fn build(self) -> (JobRegistry, CallLog) {
        (self.registry, self.log)
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
