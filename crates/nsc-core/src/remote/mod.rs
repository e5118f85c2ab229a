//! Remote file endpoint seam
//!
//! The engine only needs to list a directory, fetch a file and push a
//! file. Secure transport is provided behind [`Connector`]; the bundled
//! [`DirectoryConnector`] serves a session from a locally mounted mirror.

mod directory;

pub use directory::{DirectoryConnector, DirectorySession};

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::Result;
use crate::config::FtpSettings;

/// One remote directory listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteEntry {
    pub name: String,
    pub modified_at: DateTime<Utc>,
    pub accessed_at: Option<DateTime<Utc>>,
}

/// An open session on the remote endpoint, held for a whole run
pub trait RemoteSession {
    /// List the files of a remote directory, in server order
    fn list(&mut self, path: &str) -> Result<Vec<RemoteEntry>>;

    /// Download `remote_path` to `local_path`
    fn get(&mut self, remote_path: &str, local_path: &Path) -> Result<()>;

    /// Upload `local_path` to `remote_path`
    fn put(&mut self, local_path: &Path, remote_path: &str) -> Result<()>;

    /// End the session
    fn close(self: Box<Self>) -> Result<()>;
}

/// Opens sessions on the remote endpoint
pub trait Connector {
    /// # Errors
    ///
    /// Returns [`crate::Error::Connection`] if the endpoint is unreachable
    /// or rejects the credentials.
    fn connect(&self, settings: &FtpSettings) -> Result<Box<dyn RemoteSession>>;
}

/// Join a remote directory and a file name with `/`.
pub fn remote_join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_join_handles_separators() {
        assert_eq!(remote_join("/outgoing", "a.csv"), "/outgoing/a.csv");
        assert_eq!(remote_join("/outgoing/", "a.csv"), "/outgoing/a.csv");
        assert_eq!(remote_join("", "a.csv"), "a.csv");
    }
}
