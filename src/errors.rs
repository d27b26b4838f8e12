// src/errors.rs

//! Crate-wide error types.
//!
//! Two layers:
//! - [`DojobberError`] is what the engine itself returns to callers
//!   (configuration problems, cycles, cleanup failures).
//! - [`JobError`] is the error value a job raised from its constructor,
//!   `check`, `run` or `cleanup`. Those are caught per node and kept in the
//!   exception maps, so they need to be cheap to clone.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DojobberError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Cycle detected in job graph: {0}")]
    DagCycle(String),

    #[error("No root job configured; call configure() first")]
    NotConfigured,

    #[error("Cleanup of job '{job}' failed")]
    Cleanup {
        job: String,
        #[source]
        source: JobError,
    },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DojobberError>;

/// Error raised by a job, shared between the exception maps and the
/// job's own phase record.
#[derive(Clone)]
pub struct JobError(Arc<anyhow::Error>);

impl JobError {
    pub fn msg<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self(Arc::new(anyhow::Error::msg(message)))
    }

    /// Access the wrapped `anyhow` error (e.g. to walk its chain).
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl From<anyhow::Error> for JobError {
    fn from(err: anyhow::Error) -> Self {
        // A run-only job re-raises its stored Run error; unwrap it instead of
        // nesting another layer.
        match err.downcast::<JobError>() {
            Ok(job_err) => job_err,
            Err(err) => Self(Arc::new(err)),
        }
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl fmt::Debug for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}
