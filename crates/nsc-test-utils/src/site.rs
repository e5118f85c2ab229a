//! [`TestSite`] builder for sync scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tempfile::TempDir;

/// Remote directory the receive run lists
pub const REMOTE_RECEIVE: &str = "/outgoing";
/// Remote directory the send run uploads to
pub const REMOTE_SEND: &str = "/incoming";

/// A temporary site: shared root marker, endpoint mirror, local receive,
/// send and archive directories, and `Data/config.yml` wired to them.
///
/// # Example
///
/// ```rust,no_run
/// use nsc_test_utils::TestSite;
///
/// let site = TestSite::new();
/// site.add_remote_file("a.csv", "x", 1_700_000_000);
/// site.write_overlay("nsc:\n  rename:\n    R1:\n      replace: \"{nsctype}.csv\"\n");
/// site.assert_file_exists("local/receive");
/// ```
pub struct TestSite {
    temp_dir: TempDir,
}

impl Default for TestSite {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSite {
    /// Create the directory layout and the base configuration.
    pub fn new() -> Self {
        let site = Self {
            temp_dir: TempDir::new().unwrap(),
        };
        fs::write(site.root().join("_IERG_SHARED_ROOT_DIR_"), "").unwrap();
        for dir in [
            site.remote_receive_dir(),
            site.remote_send_dir(),
            site.receive_dir(),
            site.send_dir(),
            site.archive_dir(),
            site.root().join("Data"),
        ] {
            fs::create_dir_all(dir).unwrap();
        }
        fs::write(site.config_file(), site.base_config()).unwrap();
        site
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Directory standing in for the remote endpoint
    pub fn remote_root(&self) -> PathBuf {
        self.root().join("remote")
    }

    pub fn remote_receive_dir(&self) -> PathBuf {
        self.remote_root().join(REMOTE_RECEIVE.trim_start_matches('/'))
    }

    pub fn remote_send_dir(&self) -> PathBuf {
        self.remote_root().join(REMOTE_SEND.trim_start_matches('/'))
    }

    pub fn receive_dir(&self) -> PathBuf {
        self.root().join("local").join("receive")
    }

    pub fn send_dir(&self) -> PathBuf {
        self.root().join("local").join("send")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.root().join("local").join("archive")
    }

    pub fn log_file(&self) -> PathBuf {
        self.root().join("local").join("nsc_log.csv")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root().join("Data").join("config.yml")
    }

    pub fn overlay_file(&self) -> PathBuf {
        self.root().join("Data").join("config.local.yml")
    }

    /// The base `Data/config.yml` document: no rules, no import.
    pub fn base_config(&self) -> String {
        format!(
            "nsc:
  ftp:
    host: sftp.test.invalid
    port: 22
    username: tester
    password: secret
    receive_path: {remote_receive}
    send_path: {remote_send}
    mount: '{mount}'
  local:
    receive_path: '{receive}'
    send_path: '{send}'
    archive_path: '{archive}'
    log_file: '{log}'
",
            remote_receive = REMOTE_RECEIVE,
            remote_send = REMOTE_SEND,
            mount = self.remote_root().display(),
            receive = self.receive_dir().display(),
            send = self.send_dir().display(),
            archive = self.archive_dir().display(),
            log = self.log_file().display(),
        )
    }

    /// Write `Data/config.local.yml`, merged over the base configuration.
    pub fn write_overlay(&self, yaml: &str) {
        fs::write(self.overlay_file(), yaml).unwrap();
    }

    /// Place a file in the remote receive directory with the given
    /// modification time in Unix seconds.
    pub fn add_remote_file(&self, name: &str, content: &str, mtime: i64) -> PathBuf {
        let path = self.remote_receive_dir().join(name);
        fs::write(&path, content).unwrap();
        set_mtime(&path, mtime);
        path
    }

    /// Place a file in the local outbox with the given modification time.
    pub fn add_outbox_file(&self, name: &str, content: &str, mtime: i64) -> PathBuf {
        let path = self.send_dir().join(name);
        fs::write(&path, content).unwrap();
        set_mtime(&path, mtime);
        path
    }

    /// Sorted file names directly inside `dir`
    pub fn file_names(&self, dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Lines of the audit log, header included; empty if it does not exist.
    pub fn log_lines(&self) -> Vec<String> {
        fs::read_to_string(self.log_file())
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Assert that `path` (relative to the site root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the site root) does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }
}

/// Set both access and modification time of `path` to `secs`.
pub fn set_mtime(path: &Path, secs: i64) {
    let stamp = FileTime::from_unix_time(secs, 0);
    filetime::set_file_times(path, stamp, stamp).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_site_has_layout_and_config() {
        let site = TestSite::new();
        site.assert_file_exists("_IERG_SHARED_ROOT_DIR_");
        site.assert_file_exists("Data/config.yml");
        site.assert_file_exists("remote/outgoing");
        site.assert_file_not_exists("Data/config.local.yml");
        assert!(site.base_config().contains("receive_path: /outgoing"));
    }

    #[test]
    fn remote_files_carry_requested_mtime() {
        let site = TestSite::new();
        let path = site.add_remote_file("a.csv", "x", 1_700_000_000);
        let meta = fs::metadata(path).unwrap();
        assert_eq!(
            FileTime::from_last_modification_time(&meta).unix_seconds(),
            1_700_000_000
        );
    }
}
