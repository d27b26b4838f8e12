// src/job/mod.rs

//! The unit of work.
//!
//! - [`Job`] is the base verify/act capability set: `check`, `run` and an
//!   optional `cleanup`.
//! - [`variants`] holds the framework-supplied variants: run-only jobs and
//!   the no-op grouping job.
//! - [`definition`] holds the registration table that maps job names to
//!   factories and dependency lists.

pub mod definition;
pub mod variants;

use serde_json::{Map, Value};

use crate::errors::JobError;
use crate::types::Phase;

pub use definition::{JobDefinition, JobFactory, JobRegistry};
pub use variants::{NoopJob, Runonly, RunonlyJob};

/// Key/value store handed to jobs. One private map per instance, one shared
/// map per run.
pub type Storage = Map<String, Value>;

/// An idempotent operational task.
///
/// `check` verifies that the desired end state already holds and must fail if
/// it does not. It should be free of side effects, though nothing enforces
/// that. `run` establishes the end state. The engine calls `check`, then (on
/// failure) `run`, then `check` again; the second `check` decides the outcome.
pub trait Job: Send {
    fn check(&mut self, ctx: &mut JobContext<'_>) -> anyhow::Result<Value>;

    fn run(&mut self, ctx: &mut JobContext<'_>) -> anyhow::Result<Value>;

    /// Teardown invoked once the whole run is over, whatever this job's own
    /// outcome was, as long as it was instantiated.
    fn cleanup(&mut self, _ctx: &mut JobContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Arguments forwarded verbatim to every `check` / `run` call of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobArgs {
    pub positional: Vec<Value>,
    pub keyword: Map<String, Value>,
}

impl JobArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    pub fn kw(&self, key: &str) -> Option<&Value> {
        self.keyword.get(key)
    }

    /// Keyword argument as a string slice, if present and a JSON string.
    pub fn kw_str(&self, key: &str) -> Option<&str> {
        self.keyword.get(key).and_then(Value::as_str)
    }

    /// Keyword argument interpreted as a flag. Missing, `null` and `false`
    /// are all false.
    pub fn kw_flag(&self, key: &str) -> bool {
        match self.keyword.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => true,
        }
    }
}

/// Outcomes of the three lifecycle calls of one job instance.
///
/// Jobs are not expected to depend on this for correctness; the run-only
/// adapter is the one in-tree user.
#[derive(Debug, Clone, Default)]
pub struct PhaseRecord {
    pub check: Option<Result<Value, JobError>>,
    pub run: Option<Result<Value, JobError>>,
    pub recheck: Option<Result<Value, JobError>>,
}

/// Everything a job sees during one call.
pub struct JobContext<'a> {
    name: &'a str,
    phase: Phase,
    args: &'a JobArgs,
    storage: &'a mut Storage,
    shared: &'a mut Storage,
    record: &'a PhaseRecord,
}

impl<'a> JobContext<'a> {
    pub fn new(
        name: &'a str,
        phase: Phase,
        args: &'a JobArgs,
        storage: &'a mut Storage,
        shared: &'a mut Storage,
        record: &'a PhaseRecord,
    ) -> Self {
        Self {
            name,
            phase,
            args,
            storage,
            shared,
            record,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn args(&self) -> &JobArgs {
        self.args
    }

    /// Private storage of this instance, empty when the instance is created.
    pub fn storage(&mut self) -> &mut Storage {
        &mut *self.storage
    }

    /// Storage shared by every job in the run.
    ///
    /// Convention: keep your entries under a sub-map named after your job,
    /// e.g. `shared["InstallNginx"]["version"]`.
    pub fn shared(&mut self) -> &mut Storage {
        &mut *self.shared
    }

    /// Result of this instance's `run`, if it has been called.
    pub fn run_outcome(&self) -> Option<&Result<Value, JobError>> {
        self.record.run.as_ref()
    }

    pub fn record(&self) -> &PhaseRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn args_builder_and_accessors() {
        let args = JobArgs::new()
            .arg("arg1")
            .kwarg("movie", "MST3K")
            .kwarg("couch_space", true)
            .kwarg("tries", 3);

        assert_eq!(args.get(0), Some(&json!("arg1")));
        assert_eq!(args.kw_str("movie"), Some("MST3K"));
        assert!(args.kw_flag("couch_space"));
        assert!(args.kw_flag("tries"));
        assert!(!args.kw_flag("missing"));
        assert_eq!(args.kw_str("tries"), None);
    }

    #[test]
    fn context_exposes_both_storages() {
        let args = JobArgs::new();
        let mut private = Storage::new();
        let mut shared = Storage::new();
        let record = PhaseRecord::default();

        {
            let mut ctx =
                JobContext::new("A", Phase::Check, &args, &mut private, &mut shared, &record);
            ctx.storage().insert("runran".into(), json!(true));
            ctx.shared().insert("A".into(), json!({ "seen": 1 }));
            assert_eq!(ctx.name(), "A");
            assert_eq!(ctx.phase(), Phase::Check);
            assert!(ctx.run_outcome().is_none());
        }

        assert_eq!(private.get("runran"), Some(&json!(true)));
        assert_eq!(shared["A"]["seen"], json!(1));
    }
}
