// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DojobberError, Result};
use crate::types::SHARED_STORAGE_KEY;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::DojobberError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.job))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_job_names(cfg)?;
    validate_job_dependencies(cfg)?;
    validate_patterns(cfg)?;
    validate_root(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(DojobberError::ConfigError(
            "job file must contain at least one [job.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_job_names(cfg: &RawConfigFile) -> Result<()> {
    for name in cfg.job.keys() {
        if name.trim().is_empty() {
            return Err(DojobberError::ConfigError(
                "job names must not be empty".to_string(),
            ));
        }
        if name == SHARED_STORAGE_KEY {
            return Err(DojobberError::ConfigError(format!(
                "job name '{}' is reserved",
                SHARED_STORAGE_KEY
            )));
        }
    }
    Ok(())
}

fn validate_job_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, job) in cfg.job.iter() {
        for dep in job.after.iter() {
            if !cfg.job.contains_key(dep) {
                return Err(DojobberError::ConfigError(format!(
                    "job '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(DojobberError::ConfigError(format!(
                    "job '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }
        if job.check_stdout.is_some() && job.check.is_none() {
            return Err(DojobberError::ConfigError(format!(
                "job '{}' sets `check_stdout` without a `check` command",
                name
            )));
        }
    }
    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    for (name, job) in cfg.job.iter() {
        if let Some(pattern) = &job.check_stdout {
            Regex::new(pattern).map_err(|e| {
                DojobberError::ConfigError(format!(
                    "job '{}' has invalid `check_stdout` pattern: {}",
                    name, e
                ))
            })?;
        }
    }
    Ok(())
}

fn validate_root(cfg: &RawConfigFile) -> Result<()> {
    if let Some(root) = &cfg.config.root {
        if !cfg.job.contains_key(root) {
            return Err(DojobberError::ConfigError(format!(
                "[config].root names unknown job '{}'",
                root
            )));
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: job -> dependency.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.job.keys() {
        graph.add_node(name.as_str());
    }

    for (name, job) in cfg.job.iter() {
        for dep in job.after.iter() {
            graph.add_edge(name.as_str(), dep.as_str(), ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(DojobberError::DagCycle(format!(
                "cycle detected in job graph involving job '{}'",
                node
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::JobConfig;

    fn job(after: &[&str]) -> JobConfig {
        JobConfig {
            run: Some("true".into()),
            after: after.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn raw(jobs: Vec<(&str, JobConfig)>) -> RawConfigFile {
        let mut cfg = RawConfigFile::default();
        for (name, j) in jobs {
            cfg.job.insert(name.to_string(), j);
        }
        cfg
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(matches!(
            ConfigFile::try_from(RawConfigFile::default()),
            Err(DojobberError::ConfigError(_))
        ));
    }

    #[test]
    fn self_dependency_is_rejected() {
        let err = ConfigFile::try_from(raw(vec![("A", job(&["A"]))])).unwrap_err();
        assert!(err.to_string().contains("cannot depend on itself"));
    }

    #[test]
    fn check_stdout_requires_check() {
        let mut j = job(&[]);
        j.check_stdout = Some("ok".into());
        let err = ConfigFile::try_from(raw(vec![("A", j)])).unwrap_err();
        assert!(err.to_string().contains("without a `check`"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let mut j = job(&[]);
        j.check = Some("true".into());
        j.check_stdout = Some("(unclosed".into());
        let err = ConfigFile::try_from(raw(vec![("A", j)])).unwrap_err();
        assert!(err.to_string().contains("invalid `check_stdout` pattern"));
    }

    #[test]
    fn unknown_root_is_rejected() {
        let mut cfg = raw(vec![("A", job(&[]))]);
        cfg.config.root = Some("B".into());
        let err = ConfigFile::try_from(cfg).unwrap_err();
        assert!(err.to_string().contains("unknown job 'B'"));
    }

    #[test]
    fn cycle_is_rejected() {
        let cfg = raw(vec![("A", job(&["B"])), ("B", job(&["A"]))]);
        match ConfigFile::try_from(cfg) {
            Err(DojobberError::DagCycle(msg)) => assert!(msg.contains("cycle detected")),
            other => panic!("expected DagCycle, got {other:?}"),
        }
    }

    #[test]
    fn default_root_is_the_single_top_job() {
        let cfg = ConfigFile::try_from(raw(vec![
            ("deploy", job(&["install"])),
            ("install", job(&[])),
        ]))
        .unwrap();
        assert_eq!(cfg.default_root(), Some("deploy"));

        let two_tops = ConfigFile::try_from(raw(vec![("a", job(&[])), ("b", job(&[]))])).unwrap();
        assert_eq!(two_tops.default_root(), None);
    }
}
