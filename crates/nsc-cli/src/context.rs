//! Run context: the shared root and the merged configuration
//!
//! Commands work from anywhere below the shared root, the way the
//! scheduled scripts do.

use std::path::{Path, PathBuf};

use nsc_core::{Config, ConfigResolver};
use nsc_fs::{LOCK_FILE_NAME, RunLock};

use crate::error::{CliError, Result};

/// Everything a command needs to run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Shared root directory; import commands run from here
    pub root: PathBuf,
    pub config: Config,
}

impl RunContext {
    /// Resolve the configuration from `cwd`, or from `sources` when given.
    pub fn load(cwd: &Path, sources: &[PathBuf]) -> Result<Self> {
        let resolver = ConfigResolver::new(cwd).with_sources(sources.iter().cloned());
        tracing::debug!(sources = ?resolver.sources(), "resolving configuration");

        Ok(Self {
            root: resolver.root(),
            config: resolver.resolve()?,
        })
    }

    /// Take the single-run lock kept in the local receive directory.
    ///
    /// A second concurrent run fails fast instead of racing this one for
    /// the watermark.
    pub fn lock(&self) -> Result<RunLock> {
        let path = self.config.nsc.local.receive_path.join(LOCK_FILE_NAME);
        RunLock::acquire(&path).map_err(|e| match e {
            nsc_fs::Error::LockFailed { path } => CliError::user(format!(
                "another nsc run is in progress (lock held on {})",
                path.display()
            )),
            other => other.into(),
        })
    }
}
