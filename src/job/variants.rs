// src/job/variants.rs

//! Framework-supplied job variants.

use anyhow::bail;
use serde_json::Value;

use super::{Job, JobContext};
use crate::types::Phase;

/// Message of the deliberate first-check failure of a run-only job.
pub const RUNONLY_CHECK_MESSAGE: &str = "Runonly node check intentionally fails first time.";

/// A job that only has an action and no way to verify it.
///
/// Wrapped in [`Runonly`], its `run` executes exactly once per lifecycle
/// (never in no-act mode) and its success or failure decides the node's
/// outcome. Only useful when the action is idempotent.
pub trait RunonlyJob: Send {
    fn run(&mut self, ctx: &mut JobContext<'_>) -> anyhow::Result<Value>;

    fn cleanup(&mut self, _ctx: &mut JobContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Adapts a [`RunonlyJob`] into a [`Job`] by supplying its `check`.
///
/// The first check always fails so that `run` is called; the recheck hands
/// back whatever `run` produced.
#[derive(Debug, Clone, Default)]
pub struct Runonly<R>(pub R);

impl<R: RunonlyJob> Job for Runonly<R> {
    fn check(&mut self, ctx: &mut JobContext<'_>) -> anyhow::Result<Value> {
        if ctx.phase() == Phase::Check {
            bail!(RUNONLY_CHECK_MESSAGE);
        }
        match ctx.run_outcome() {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(err)) => Err(err.clone().into()),
            None => bail!(RUNONLY_CHECK_MESSAGE),
        }
    }

    fn run(&mut self, ctx: &mut JobContext<'_>) -> anyhow::Result<Value> {
        self.0.run(ctx)
    }

    fn cleanup(&mut self, ctx: &mut JobContext<'_>) -> anyhow::Result<()> {
        self.0.cleanup(ctx)
    }
}

/// Always succeeds; exists only to group dependencies under one name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopJob;

impl Job for NoopJob {
    fn check(&mut self, _ctx: &mut JobContext<'_>) -> anyhow::Result<Value> {
        Ok(Value::Null)
    }

    fn run(&mut self, _ctx: &mut JobContext<'_>) -> anyhow::Result<Value> {
        Ok(Value::Null)
    }
}
