//! Watermark persistence
//!
//! The watermark is the modification time of the newest remote file that
//! a completed run processed. Remote entries at or before it are skipped.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::{Error, Result};

/// Name of the marker file in the local receive directory
pub const MARKER_FILE_NAME: &str = "__Latest File Date";

/// Durable storage for the watermark scalar
pub trait WatermarkStore {
    /// The stored watermark, or `None` before the first completed run
    fn read(&self) -> Result<Option<DateTime<Utc>>>;

    /// Atomically replace the stored watermark
    fn write(&mut self, watermark: DateTime<Utc>) -> Result<()>;
}

/// Stores the watermark as the modification time of an empty marker file
#[derive(Debug, Clone)]
pub struct MarkerFile {
    path: PathBuf,
}

impl MarkerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The marker inside a receive directory
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(MARKER_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, err: impl std::fmt::Display) -> Error {
        Error::Watermark {
            path: self.path.clone(),
            message: err.to_string(),
        }
    }
}

impl WatermarkStore for MarkerFile {
    fn read(&self) -> Result<Option<DateTime<Utc>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        nsc_fs::io::modified_time(&self.path)
            .map(Some)
            .map_err(|e| self.error(e))
    }

    fn write(&mut self, watermark: DateTime<Utc>) -> Result<()> {
        nsc_fs::io::touch_atomic(&self.path, watermark).map_err(|e| self.error(e))?;
        tracing::info!(path = %self.path.display(), %watermark, "watermark committed");
        Ok(())
    }
}
