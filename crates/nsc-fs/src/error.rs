//! Error types for nsc-fs

use std::path::PathBuf;

/// Result type for nsc-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in nsc-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Another run holds the lock at {path}")]
    LockFailed { path: PathBuf },

    #[error("Archive target already exists: {path}")]
    ArchiveCollision { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
