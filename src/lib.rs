// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod job;
pub mod logging;
pub mod shell;
pub mod types;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::JobGraph;

pub use crate::dag::GraphView;
pub use crate::engine::{DoJobber, JobberOptions, NodeObserver, OutcomeSummary};
pub use crate::errors::{DojobberError, JobError};
pub use crate::job::{
    Job, JobArgs, JobContext, JobDefinition, JobRegistry, NoopJob, Runonly, RunonlyJob, Storage,
};
pub use crate::types::{JobName, NodeMark, NodeStatus, Phase};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - job file loading
/// - shell job registry
/// - engine configuration from `[config]` and CLI flags
/// - the status summary on stdout
///
/// Returns whether every job succeeded.
pub fn run(args: CliArgs) -> Result<bool> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading job file {}", config_path.display()))?;

    let root = args
        .root
        .clone()
        .or_else(|| cfg.default_root().map(str::to_string))
        .context("no root job: set [config].root or pass --root")?;

    let registry = shell::registry_from_config(&cfg)?;

    if args.dry_run {
        let graph = JobGraph::build(&registry, &root)?;
        print_dry_run(&cfg, &graph);
        return Ok(true);
    }

    let mut options = cfg.config.options();
    options.no_act |= args.no_act;
    options.verbose |= args.verbose;
    options.debug |= args.debug;
    if args.no_cleanup {
        options.cleanup = false;
    }

    let mut jobber = DoJobber::new(registry);
    jobber.configure(&root, options)?;
    jobber.set_args(args.job_args());
    jobber.checknrun()?;

    print_summary(&jobber);
    let success = jobber.success();
    info!(success, "done");
    Ok(success)
}

/// Simple dry-run output: print jobs, deps and commands in traversal order.
fn print_dry_run(cfg: &ConfigFile, graph: &JobGraph) {
    println!("dojobber dry-run");
    println!("  config.root = {}", graph.root());
    println!("  config.no_act = {}", cfg.config.no_act);
    println!("  config.cleanup = {}", cfg.config.cleanup);
    println!();

    let order = graph.post_order(graph.root());
    println!("jobs ({}):", order.len());
    for name in order.iter() {
        println!("  - {name}");
        let Some(job) = cfg.job.get(name) else {
            continue;
        };
        println!("      kind: {:?}", job.kind());
        if let Some(ref check) = job.check {
            println!("      check: {check}");
        }
        if let Some(ref pattern) = job.check_stdout {
            println!("      check_stdout: {pattern}");
        }
        if let Some(ref run) = job.run {
            println!("      run: {run}");
        }
        if let Some(ref cleanup) = job.cleanup {
            println!("      cleanup: {cleanup}");
        }
        if !job.after.is_empty() {
            println!("      after: {:?}", job.after);
        }
    }

    debug!("dry-run complete (no execution)");
}

fn print_summary(jobber: &DoJobber) {
    for (name, status) in jobber.statuses() {
        match jobber.exception(name) {
            Some(err) => println!("{name}: {status} ({err})"),
            None => println!("{name}: {status}"),
        }
    }
    let summary = jobber.summary();
    println!(
        "{} succeeded, {} failed, {} unattempted",
        summary.succeeded, summary.failed, summary.unattempted
    );
}
