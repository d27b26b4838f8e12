// src/job/definition.rs

//! Registration table: job name -> factory + declared dependencies.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{Job, NoopJob, Runonly, RunonlyJob};
use crate::errors::{DojobberError, Result};
use crate::types::{JobName, SHARED_STORAGE_KEY};

/// Builds a fresh job instance. May fail; a failure is recorded as the
/// node's failure rather than aborting the run.
pub type JobFactory = Arc<dyn Fn() -> anyhow::Result<Box<dyn Job>> + Send + Sync>;

/// Static description of one node: its name, its dependencies in declared
/// order, and how to construct it.
#[derive(Clone)]
pub struct JobDefinition {
    name: JobName,
    deps: Vec<JobName>,
    factory: JobFactory,
}

impl fmt::Debug for JobDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDefinition")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}

impl JobDefinition {
    /// Define a job from a fallible constructor.
    pub fn new<J, F>(name: impl Into<JobName>, factory: F) -> Self
    where
        J: Job + 'static,
        F: Fn() -> anyhow::Result<J> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            deps: Vec::new(),
            factory: Arc::new(move || -> anyhow::Result<Box<dyn Job>> {
                Ok(Box::new(factory()?))
            }),
        }
    }

    /// Define a job constructed with `Default`.
    pub fn from_default<J>(name: impl Into<JobName>) -> Self
    where
        J: Job + Default + 'static,
    {
        Self::new(name, || Ok(J::default()))
    }

    /// Define a run-only job; its check is supplied by [`Runonly`].
    pub fn runonly<R, F>(name: impl Into<JobName>, factory: F) -> Self
    where
        R: RunonlyJob + 'static,
        F: Fn() -> anyhow::Result<R> + Send + Sync + 'static,
    {
        Self::new(name, move || Ok(Runonly(factory()?)))
    }

    /// Define a no-op job that only groups its dependencies.
    pub fn noop(name: impl Into<JobName>) -> Self {
        Self::from_default::<NoopJob>(name)
    }

    /// Declare a dependency. Order of calls is traversal order.
    pub fn after(mut self, dep: impl Into<JobName>) -> Self {
        self.deps.push(dep.into());
        self
    }

    pub fn after_all<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<JobName>,
    {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn deps(&self) -> &[JobName] {
        &self.deps
    }

    /// Construct a new instance.
    pub fn instantiate(&self) -> anyhow::Result<Box<dyn Job>> {
        (self.factory)()
    }
}

/// All job definitions known to an engine, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    defs: BTreeMap<JobName, JobDefinition>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. Names are unique and may not collide with the
    /// shared-storage key.
    pub fn register(&mut self, def: JobDefinition) -> Result<()> {
        if def.name.is_empty() {
            return Err(DojobberError::ConfigError(
                "job name must not be empty".to_string(),
            ));
        }
        if def.name == SHARED_STORAGE_KEY {
            return Err(DojobberError::ConfigError(format!(
                "job name '{}' is reserved for shared storage",
                SHARED_STORAGE_KEY
            )));
        }
        if self.defs.contains_key(&def.name) {
            return Err(DojobberError::ConfigError(format!(
                "job '{}' is registered more than once",
                def.name
            )));
        }
        self.defs.insert(def.name.clone(), def);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, def: JobDefinition) -> Result<Self> {
        self.register(def)?;
        Ok(self)
    }

    /// Append a dependency to an already registered job.
    ///
    /// This is the hook for dependencies generated at configuration time
    /// (e.g. one job per host); it must happen before the graph is built.
    pub fn add_dependency(&mut self, job: &str, dep: impl Into<JobName>) -> Result<()> {
        let def = self
            .defs
            .get_mut(job)
            .ok_or_else(|| DojobberError::JobNotFound(job.to_string()))?;
        def.deps.push(dep.into());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&JobDefinition> {
        self.defs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(|s| s.as_str())
    }
}
