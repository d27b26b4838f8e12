// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::engine::JobberOptions;

/// Job file exactly as read from TOML, before validation.
///
/// ```toml
/// [config]
/// root = "deploy"
/// no_act = false
///
/// [job.deploy]
/// after = ["install", "notify"]
///
/// [job.install]
/// check = "test -x /usr/sbin/nginx"
/// run = "apt-get install -y nginx"
///
/// [job.notify]
/// run = "echo deployed"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All jobs from `[job.<name>]`, keyed by job name.
    #[serde(default)]
    pub job: BTreeMap<String, JobConfig>,
}

/// Validated job file. Only constructed through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub job: BTreeMap<String, JobConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, job: BTreeMap<String, JobConfig>) -> Self {
        Self { config, job }
    }

    /// The configured root, or else the only job nothing depends on.
    pub fn default_root(&self) -> Option<&str> {
        if let Some(root) = self.config.root.as_deref() {
            return Some(root);
        }
        let mut tops = self.job.keys().filter(|name| {
            !self
                .job
                .values()
                .any(|j| j.after.iter().any(|dep| dep == *name))
        });
        match (tops.next(), tops.next()) {
            (Some(only), None) => Some(only.as_str()),
            _ => None,
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Job to check and run; see [`ConfigFile::default_root`].
    #[serde(default)]
    pub root: Option<String>,

    #[serde(default)]
    pub no_act: bool,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_cleanup")]
    pub cleanup: bool,
}

fn default_cleanup() -> bool {
    true
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            root: None,
            no_act: false,
            verbose: false,
            debug: false,
            cleanup: default_cleanup(),
        }
    }
}

impl ConfigSection {
    pub fn options(&self) -> JobberOptions {
        JobberOptions::default()
            .with_no_act(self.no_act)
            .with_verbose(self.verbose)
            .with_debug(self.debug)
            .with_cleanup(self.cleanup)
    }
}

/// `[job.<name>]` section. Commands run through `sh -c`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Verification command; exit status 0 means the end state holds.
    #[serde(default)]
    pub check: Option<String>,

    /// Action establishing the end state.
    #[serde(default)]
    pub run: Option<String>,

    /// Teardown run after the whole graph has been processed.
    #[serde(default)]
    pub cleanup: Option<String>,

    /// Regex the check's stdout must match for the check to pass.
    #[serde(default)]
    pub check_stdout: Option<String>,

    /// Dependencies, checked and run before this job.
    #[serde(default)]
    pub after: Vec<String>,
}

/// Which job variant a `[job.<name>]` section describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Has a `check` (and usually a `run`).
    Verified,
    /// Only a `run`: executed once, its exit status decides.
    RunOnly,
    /// Neither: groups dependencies.
    Noop,
}

impl JobConfig {
    pub fn kind(&self) -> JobKind {
        match (&self.check, &self.run) {
            (Some(_), _) => JobKind::Verified,
            (None, Some(_)) => JobKind::RunOnly,
            (None, None) => JobKind::Noop,
        }
    }
}
