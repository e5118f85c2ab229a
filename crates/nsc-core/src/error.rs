//! Error types for nsc-core

use std::path::PathBuf;

/// Result type for nsc-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in nsc-core operations
///
/// Filenames that do not follow the naming grammar are not errors; they
/// decompose to an unstructured name and keep their remote name.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The remote endpoint could not be reached
    #[error("Cannot connect to {endpoint}: {message}")]
    Connection { endpoint: String, message: String },

    /// The remote directory could not be listed
    #[error("Cannot list remote directory {path}: {message}")]
    List { path: String, message: String },

    /// A single file failed to transfer
    #[error("Transfer of {remote} failed: {message}")]
    Transfer { remote: String, message: String },

    /// A rule template references a field that has no value
    #[error("Rule '{rule}' references unknown field '{{{field}}}'")]
    RuleTemplate { rule: String, field: String },

    /// A synthesized local name would escape the receive directory
    #[error("Local name '{name}' is not a relative path inside the receive directory")]
    InvalidLocalName { name: String },

    /// The import command could not be started or rendered
    #[error("Import dispatch for '{entry}' failed: {message}")]
    ImportDispatch { entry: String, message: String },

    /// The watermark marker could not be read or written
    #[error("Watermark at {path}: {message}")]
    Watermark { path: PathBuf, message: String },

    /// The audit log could not be read or written
    #[error("Audit log at {path}: {source}")]
    Audit {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Filesystem error from nsc-fs
    #[error(transparent)]
    Fs(#[from] nsc_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::Transfer { .. } | Self::InvalidLocalName { .. } | Self::ImportDispatch { .. }
        )
    }
}
