// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};
use serde_json::Value;

use crate::job::JobArgs;

/// Command-line arguments for `dojobber`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dojobber",
    version,
    about = "Check and run a graph of idempotent jobs, dependencies first.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the job file (TOML).
    ///
    /// Default: `Dojobber.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Dojobber.toml")]
    pub config: String,

    /// Job to check and run. Overrides `[config].root`.
    #[arg(long, value_name = "NAME")]
    pub root: Option<String>,

    /// Only check; never run anything.
    #[arg(long)]
    pub no_act: bool,

    /// Skip job cleanup at the end of the run.
    #[arg(long)]
    pub no_cleanup: bool,

    /// Log every check / run / recheck outcome.
    #[arg(long)]
    pub verbose: bool,

    /// Also log full error chains. Implies `--verbose`.
    #[arg(long)]
    pub debug: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DOJOBBER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the job graph, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,

    /// Keyword argument passed to every job, as `KEY=VALUE`.
    #[arg(long = "kw", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub kw: Vec<(String, String)>,

    /// Positional arguments passed to every job.
    #[arg(value_name = "ARGS")]
    pub args: Vec<String>,
}

impl CliArgs {
    /// Arguments forwarded to the jobs.
    pub fn job_args(&self) -> JobArgs {
        let mut args = JobArgs::new();
        for arg in self.args.iter() {
            args = args.arg(Value::String(arg.clone()));
        }
        for (key, value) in self.kw.iter() {
            args = args.kwarg(key.clone(), Value::String(value.clone()));
        }
        args
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
