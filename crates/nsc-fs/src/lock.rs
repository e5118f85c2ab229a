//! Advisory single-run lock

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, Result};

/// File name of the run lock inside the directory it guards
pub const LOCK_FILE_NAME: &str = ".nsc.lock";

/// An exclusive advisory lock held for the lifetime of a run.
///
/// The lock file is left in place; only the OS lock is released on drop.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Try to take the lock without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockFailed`] if another process holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::io(path, e))?;

        file.try_lock_exclusive().map_err(|_| Error::LockFailed {
            path: path.to_path_buf(),
        })?;

        tracing::debug!(path = %path.display(), "run lock acquired");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
