// src/shell/mod.rs

//! Jobs backed by shell commands from the job file.
//!
//! Every command runs through `sh -c`. Positional job arguments are passed
//! as `$1..`, keyword arguments as `DOJOBBER_<KEY>` environment variables.
//! A command succeeds on exit status 0; its trimmed stdout is the result.

use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::config::{ConfigFile, JobConfig, JobKind};
use crate::errors::DojobberError;
use crate::job::{Job, JobArgs, JobContext, JobDefinition, JobRegistry, RunonlyJob};

/// Prefix of the environment variables carrying keyword arguments.
pub const ENV_PREFIX: &str = "DOJOBBER_";

/// One shell command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    script: String,
}

impl ShellCommand {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
        }
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    /// Run the command to completion and return its trimmed stdout.
    pub fn execute(&self, job: &str, args: &JobArgs) -> Result<String> {
        let mut cmd = Command::new("sh");
        // `$0` is "dojobber", so the job arguments start at `$1`.
        cmd.arg("-c").arg(&self.script).arg("dojobber");
        cmd.args(args.positional.iter().map(arg_string));
        for (key, value) in args.keyword.iter() {
            cmd.env(env_key(key), arg_string(value));
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(job = %job, cmd = %self.script, "spawning shell command");
        let output = cmd
            .output()
            .with_context(|| format!("spawning process for job '{}'", job))?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let code = output.status.code().unwrap_or(-1);
        debug!(job = %job, exit_code = code, "shell command exited");

        if !output.status.success() {
            if stderr.is_empty() {
                bail!("`{}` exited with status {}", self.script, code);
            }
            bail!("`{}` exited with status {}: {}", self.script, code, stderr);
        }
        Ok(stdout)
    }
}

/// Environment variable name for a keyword argument: `dry-run` becomes
/// `DOJOBBER_DRY_RUN`.
pub fn env_key(key: &str) -> String {
    let key: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{ENV_PREFIX}{key}")
}

fn arg_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Job with a verification command.
#[derive(Debug, Clone)]
pub struct ShellJob {
    check: ShellCommand,
    expect: Option<Regex>,
    run: Option<ShellCommand>,
    cleanup: Option<ShellCommand>,
}

impl ShellJob {
    pub fn new(check: ShellCommand) -> Self {
        Self {
            check,
            expect: None,
            run: None,
            cleanup: None,
        }
    }

    /// Require the check's stdout to match `pattern`.
    pub fn with_expect(mut self, pattern: Regex) -> Self {
        self.expect = Some(pattern);
        self
    }

    pub fn with_run(mut self, run: ShellCommand) -> Self {
        self.run = Some(run);
        self
    }

    pub fn with_cleanup(mut self, cleanup: ShellCommand) -> Self {
        self.cleanup = Some(cleanup);
        self
    }
}

impl Job for ShellJob {
    fn check(&mut self, ctx: &mut JobContext<'_>) -> Result<Value> {
        let stdout = self.check.execute(ctx.name(), ctx.args())?;
        if let Some(expect) = &self.expect {
            if !expect.is_match(&stdout) {
                bail!("check output {:?} does not match /{}/", stdout, expect);
            }
        }
        Ok(Value::String(stdout))
    }

    fn run(&mut self, ctx: &mut JobContext<'_>) -> Result<Value> {
        match &self.run {
            Some(run) => Ok(Value::String(run.execute(ctx.name(), ctx.args())?)),
            // Nothing to act with; the recheck decides.
            None => Ok(Value::Null),
        }
    }

    fn cleanup(&mut self, ctx: &mut JobContext<'_>) -> Result<()> {
        if let Some(cleanup) = &self.cleanup {
            cleanup.execute(ctx.name(), ctx.args())?;
        }
        Ok(())
    }
}

/// Run-only job: the action runs once and its exit status decides.
#[derive(Debug, Clone)]
pub struct ShellAction {
    run: ShellCommand,
    cleanup: Option<ShellCommand>,
}

impl ShellAction {
    pub fn new(run: ShellCommand) -> Self {
        Self { run, cleanup: None }
    }

    pub fn with_cleanup(mut self, cleanup: ShellCommand) -> Self {
        self.cleanup = Some(cleanup);
        self
    }
}

impl RunonlyJob for ShellAction {
    fn run(&mut self, ctx: &mut JobContext<'_>) -> Result<Value> {
        Ok(Value::String(self.run.execute(ctx.name(), ctx.args())?))
    }

    fn cleanup(&mut self, ctx: &mut JobContext<'_>) -> Result<()> {
        if let Some(cleanup) = &self.cleanup {
            cleanup.execute(ctx.name(), ctx.args())?;
        }
        Ok(())
    }
}

/// Build a registry with one definition per `[job.<name>]` section.
pub fn registry_from_config(cfg: &ConfigFile) -> crate::errors::Result<JobRegistry> {
    let mut registry = JobRegistry::new();
    for (name, job) in cfg.job.iter() {
        let def = definition_for(name, job)?.after_all(job.after.iter().cloned());
        registry.register(def)?;
    }
    Ok(registry)
}

fn definition_for(name: &str, job: &JobConfig) -> crate::errors::Result<JobDefinition> {
    let cleanup = job.cleanup.clone().map(ShellCommand::new);

    let def = match job.kind() {
        JobKind::Verified => {
            let check = job.check.clone().map(ShellCommand::new).ok_or_else(|| {
                DojobberError::ConfigError(format!("job '{}' has no check command", name))
            })?;
            let expect = job
                .check_stdout
                .as_deref()
                .map(Regex::new)
                .transpose()
                .map_err(|e| {
                    DojobberError::ConfigError(format!(
                        "job '{}' has invalid `check_stdout` pattern: {}",
                        name, e
                    ))
                })?;

            let mut shell = ShellJob::new(check);
            if let Some(expect) = expect {
                shell = shell.with_expect(expect);
            }
            if let Some(run) = job.run.clone() {
                shell = shell.with_run(ShellCommand::new(run));
            }
            if let Some(cleanup) = cleanup {
                shell = shell.with_cleanup(cleanup);
            }
            JobDefinition::new(name, move || Ok(shell.clone()))
        }
        JobKind::RunOnly => {
            let run = job.run.clone().map(ShellCommand::new).ok_or_else(|| {
                DojobberError::ConfigError(format!("job '{}' has no run command", name))
            })?;
            let mut action = ShellAction::new(run);
            if let Some(cleanup) = cleanup {
                action = action.with_cleanup(cleanup);
            }
            JobDefinition::runonly(name, move || Ok(action.clone()))
        }
        JobKind::Noop => JobDefinition::noop(name),
    };
    Ok(def)
}
