//! Sessions served from a locally mounted mirror of the endpoint

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};

use super::{Connector, RemoteEntry, RemoteSession};
use crate::config::FtpSettings;
use crate::{Error, Result};

/// Connects to a directory that mirrors the remote tree.
///
/// Remote paths such as `/outgoing` resolve under the mirror root. The
/// root comes from `nsc.ftp.mount` unless fixed with [`Self::at`].
#[derive(Debug, Clone, Default)]
pub struct DirectoryConnector {
    root: Option<PathBuf>,
}

impl DirectoryConnector {
    /// Use the mount configured in `nsc.ftp.mount`
    pub fn new() -> Self {
        Self::default()
    }

    /// Always serve sessions from `root`
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }
}

impl Connector for DirectoryConnector {
    fn connect(&self, settings: &FtpSettings) -> Result<Box<dyn RemoteSession>> {
        let endpoint = settings.endpoint();
        let root = self
            .root
            .clone()
            .or_else(|| settings.mount.clone())
            .ok_or_else(|| Error::Connection {
                endpoint: endpoint.clone(),
                message: "no transport available: set nsc.ftp.mount to the endpoint mirror"
                    .into(),
            })?;

        if !root.is_dir() {
            return Err(Error::Connection {
                endpoint,
                message: format!("mirror {} is not a directory", root.display()),
            });
        }

        tracing::info!(%endpoint, root = %root.display(), "session opened");
        Ok(Box::new(DirectorySession { root, endpoint }))
    }
}

/// A session over a mirror directory
#[derive(Debug)]
pub struct DirectorySession {
    root: PathBuf,
    endpoint: String,
}

impl DirectorySession {
    fn resolve(&self, remote_path: &str) -> Option<PathBuf> {
        let relative = Path::new(remote_path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl RemoteSession for DirectorySession {
    fn list(&mut self, path: &str) -> Result<Vec<RemoteEntry>> {
        let list_error = |message: String| Error::List {
            path: path.to_string(),
            message,
        };
        let dir = self
            .resolve(path)
            .ok_or_else(|| list_error("path escapes the endpoint root".into()))?;

        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| list_error(e.to_string()))? {
            let entry = entry.map_err(|e| list_error(e.to_string()))?;
            let metadata = entry.metadata().map_err(|e| list_error(e.to_string()))?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().map_err(|e| list_error(e.to_string()))?;
            entries.push(RemoteEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                modified_at: DateTime::<Utc>::from(modified),
                accessed_at: metadata.accessed().ok().map(DateTime::<Utc>::from),
            });
        }

        tracing::debug!(endpoint = %self.endpoint, path, count = entries.len(), "listed");
        Ok(entries)
    }

    fn get(&mut self, remote_path: &str, local_path: &Path) -> Result<()> {
        let transfer_error = |message: String| Error::Transfer {
            remote: remote_path.to_string(),
            message,
        };
        let source = self
            .resolve(remote_path)
            .ok_or_else(|| transfer_error("path escapes the endpoint root".into()))?;

        nsc_fs::io::copy_atomic(&source, local_path).map_err(|e| transfer_error(e.to_string()))?;
        Ok(())
    }

    fn put(&mut self, local_path: &Path, remote_path: &str) -> Result<()> {
        let transfer_error = |message: String| Error::Transfer {
            remote: remote_path.to_string(),
            message,
        };
        let target = self
            .resolve(remote_path)
            .ok_or_else(|| transfer_error("path escapes the endpoint root".into()))?;

        nsc_fs::io::copy_atomic(local_path, &target).map_err(|e| transfer_error(e.to_string()))?;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        tracing::debug!(endpoint = %self.endpoint, "session closed");
        Ok(())
    }
}
