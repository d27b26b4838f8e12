//! Jobs with scripted outcomes that record every call they receive.

use std::sync::{Arc, Mutex};

use anyhow::bail;
use dojobber::{Job, JobContext, Phase};
use serde_json::{Value, json};

/// Shared, ordered log of `"<job>.<phase>"` entries.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    /// Snapshot of all entries so far.
    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Entries for one phase, e.g. every `"X.cleanup"` in order.
    pub fn calls_for(&self, phase: Phase) -> Vec<String> {
        let suffix = format!(".{phase}");
        self.calls()
            .into_iter()
            .filter(|c| c.ends_with(&suffix))
            .collect()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// How the scripted job's `check` behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckBehaviour {
    /// Always passes.
    Pass,
    /// Always fails.
    Fail,
    /// Fails until `run` has succeeded on this instance.
    PassAfterRun,
}

/// A job whose check, run and cleanup outcomes are fixed up front.
#[derive(Debug, Clone)]
pub struct ScriptedJob {
    name: String,
    check: CheckBehaviour,
    run_fails: bool,
    cleanup_fails: bool,
    log: CallLog,
}

impl ScriptedJob {
    pub fn new(name: impl Into<String>, check: CheckBehaviour, log: CallLog) -> Self {
        Self {
            name: name.into(),
            check,
            run_fails: false,
            cleanup_fails: false,
            log,
        }
    }

    pub fn run_fails(mut self, fails: bool) -> Self {
        self.run_fails = fails;
        self
    }

    pub fn cleanup_fails(mut self, fails: bool) -> Self {
        self.cleanup_fails = fails;
        self
    }

    fn record(&self, ctx: &JobContext<'_>) {
        self.log.push(format!("{}.{}", self.name, ctx.phase()));
    }
}

impl Job for ScriptedJob {
    fn check(&mut self, ctx: &mut JobContext<'_>) -> anyhow::Result<Value> {
        self.record(ctx);
        match self.check {
            CheckBehaviour::Pass => Ok(json!(format!("{} ok", self.name))),
            CheckBehaviour::Fail => bail!("{} check failed", self.name),
            CheckBehaviour::PassAfterRun => match ctx.storage().get("runran") {
                Some(Value::Bool(true)) => Ok(json!(format!("{} ok after run", self.name))),
                _ => bail!("{} has not run yet", self.name),
            },
        }
    }

    fn run(&mut self, ctx: &mut JobContext<'_>) -> anyhow::Result<Value> {
        self.record(ctx);
        if self.run_fails {
            bail!("{} run failed", self.name);
        }
        ctx.storage().insert("runran".into(), Value::Bool(true));
        Ok(Value::Null)
    }

    fn cleanup(&mut self, ctx: &mut JobContext<'_>) -> anyhow::Result<()> {
        self.record(ctx);
        if self.cleanup_fails {
            bail!("{} cleanup failed", self.name);
        }
        Ok(())
    }
}
