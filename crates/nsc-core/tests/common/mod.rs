//! Test doubles shared by the nsc-core integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone, Utc};
use nsc_core::config::FtpSettings;
use nsc_core::{
    Config, ConfigResolver, Connector, DirectoryConnector, Error, ImportDispatcher, ImportOutcome,
    ImportRequest, RemoteEntry, RemoteSession, Result, RuleCatalog,
};
use nsc_test_utils::TestSite;

/// Base remote modification time used across tests
pub const T0: i64 = 1_723_716_900;

pub fn utc(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn run_time() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 8, 15, 10, 15, 0).unwrap()
}

/// Resolve the site's merged configuration and compile its rules.
pub fn load(site: &TestSite) -> (Config, RuleCatalog) {
    let config = ConfigResolver::new(site.root()).resolve().unwrap();
    let catalog = RuleCatalog::from_mapping(&config.nsc.rename).unwrap();
    (config, catalog)
}

/// Records every request and answers with a fixed exit status
#[derive(Default)]
pub struct RecordingImporter {
    pub fail: bool,
    pub calls: RefCell<Vec<(String, PathBuf, String)>>,
}

impl RecordingImporter {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }
}

impl ImportDispatcher for RecordingImporter {
    fn dispatch(&self, request: &ImportRequest<'_>) -> Result<ImportOutcome> {
        self.calls.borrow_mut().push((
            request.entry.to_string(),
            request.file.to_path_buf(),
            request.run_stamp.to_string(),
        ));
        Ok(ImportOutcome {
            success: !self.fail,
            exit_code: Some(if self.fail { 3 } else { 0 }),
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

/// Serves a mirror but fails transfers of the named files
pub struct FlakyConnector {
    inner: DirectoryConnector,
    fail: Vec<String>,
    drop_connection: bool,
}

impl FlakyConnector {
    pub fn new(root: &Path, fail: &[&str]) -> Self {
        Self {
            inner: DirectoryConnector::at(root),
            fail: fail.iter().map(|s| s.to_string()).collect(),
            drop_connection: false,
        }
    }

    /// Lose the whole connection, instead of one transfer, on the named files
    pub fn dropping(root: &Path, fail: &[&str]) -> Self {
        Self {
            drop_connection: true,
            ..Self::new(root, fail)
        }
    }
}

impl Connector for FlakyConnector {
    fn connect(&self, settings: &FtpSettings) -> Result<Box<dyn RemoteSession>> {
        Ok(Box::new(FlakySession {
            inner: self.inner.connect(settings)?,
            fail: self.fail.clone(),
            drop_connection: self.drop_connection,
        }))
    }
}

struct FlakySession {
    inner: Box<dyn RemoteSession>,
    fail: Vec<String>,
    drop_connection: bool,
}

impl FlakySession {
    fn check(&self, name: &str, remote: &str) -> Result<()> {
        if !self.fail.iter().any(|f| f == name) {
            return Ok(());
        }
        if self.drop_connection {
            return Err(Error::Connection {
                endpoint: "mirror".into(),
                message: "session closed by remote host".into(),
            });
        }
        Err(Error::Transfer {
            remote: remote.to_string(),
            message: "connection reset by peer".into(),
        })
    }
}

impl RemoteSession for FlakySession {
    fn list(&mut self, path: &str) -> Result<Vec<RemoteEntry>> {
        self.inner.list(path)
    }

    fn get(&mut self, remote_path: &str, local_path: &Path) -> Result<()> {
        let name = remote_path.rsplit('/').next().unwrap_or_default();
        self.check(name, remote_path)?;
        self.inner.get(remote_path, local_path)
    }

    fn put(&mut self, local_path: &Path, remote_path: &str) -> Result<()> {
        let name = remote_path.rsplit('/').next().unwrap_or_default();
        self.check(name, remote_path)?;
        self.inner.put(local_path, remote_path)
    }

    fn close(self: Box<Self>) -> Result<()> {
        let session = *self;
        session.inner.close()
    }
}
