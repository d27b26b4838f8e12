// src/engine/cleanup.rs

use tracing::{debug, warn};

use super::DoJobber;
use crate::errors::{DojobberError, Result};
use crate::types::Phase;

impl DoJobber {
    /// Run the cleanup hook of every job instantiated in the last run, last
    /// instantiated first.
    ///
    /// The first failing cleanup stops the walk and is returned; jobs
    /// instantiated before it are left alone. Cleaned instances are dropped,
    /// so calling this again only touches what is left.
    ///
    /// Called automatically by `checknrun` unless disabled in the options.
    pub fn cleanup(&mut self) -> Result<()> {
        while let Some(mut instance) = self.run.instances.pop() {
            debug!(job = %instance.name(), "cleanup running");
            match instance.call(Phase::Cleanup, &self.args, &mut self.run.shared) {
                Ok(_) => debug!(job = %instance.name(), "cleanup: pass"),
                Err(err) => {
                    warn!(job = %instance.name(), error = %err, "cleanup: fail");
                    return Err(DojobberError::Cleanup {
                        job: instance.name().to_string(),
                        source: err,
                    });
                }
            }
        }
        Ok(())
    }
}
