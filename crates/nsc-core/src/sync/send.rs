//! Outbound run: outbox files to the remote send location, then archive

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, Utc};

use super::report::{SendReport, UploadOutcome, UploadStatus};
use super::{SyncOptions, local_time, run_stamp};
use crate::Result;
use crate::audit::{AuditLog, AuditRecord, AuditStatus, Direction};
use crate::config::NscConfig;
use crate::remote::{Connector, RemoteSession, remote_join};

/// Drives one outbound run
pub struct SendEngine<'a> {
    config: &'a NscConfig,
    options: SyncOptions,
    run_at: DateTime<Local>,
}

impl<'a> SendEngine<'a> {
    pub fn new(config: &'a NscConfig) -> Self {
        Self {
            config,
            options: SyncOptions::default(),
            run_at: Local::now(),
        }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Fix the run time (audit `date_time` column and archive suffix)
    pub fn with_run_time(mut self, run_at: DateTime<Local>) -> Self {
        self.run_at = run_at;
        self
    }

    /// Upload every file in the outbox.
    ///
    /// Each uploaded file is logged and then moved to the archive with the
    /// run stamp appended to its stem. A failed upload leaves the file in
    /// the outbox for the next run. A file already logged as uploaded with
    /// the same timestamp is archived without uploading it again.
    pub fn run(&self, connector: &dyn Connector) -> Result<SendReport> {
        let outbox = outbox_files(&self.config.local.send_path)?;
        let mut report = SendReport {
            run_at: local_time(self.run_at.with_timezone(&Utc)),
            dry_run: self.options.dry_run,
            files: Vec::with_capacity(outbox.len()),
        };

        if outbox.is_empty() {
            tracing::info!(outbox = %self.config.local.send_path.display(), "no files to send");
            return Ok(report);
        }

        let log_file = self.config.local.outbound_log_file();
        let uploaded = uploaded_keys(log_file)?;

        if self.options.dry_run {
            for file in &outbox {
                let (name, remote_path) = self.names(file);
                let status = if uploaded.contains(&(name.clone(), file_time(file)?)) {
                    UploadStatus::AlreadyUploaded
                } else {
                    UploadStatus::Planned
                };
                report.files.push(UploadOutcome {
                    file_name: name,
                    remote_path,
                    status,
                    archived_to: None,
                    error: None,
                });
            }
            return Ok(report);
        }

        let mut audit = AuditLog::open(log_file, Direction::Outbound)?;
        let mut session = connector.connect(&self.config.ftp)?;

        let mut result = Ok(());
        for file in &outbox {
            match self.send_file(session.as_mut(), &mut audit, &uploaded, file) {
                Ok(outcome) => report.files.push(outcome),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        if let Err(e) = session.close() {
            tracing::warn!(error = %e, "closing remote session failed");
        }
        result.map(|()| report)
    }

    fn send_file(
        &self,
        session: &mut dyn RemoteSession,
        audit: &mut AuditLog,
        uploaded: &HashSet<(String, NaiveDateTime)>,
        file: &Path,
    ) -> Result<UploadOutcome> {
        let (name, remote_path) = self.names(file);
        let file_timestamp = file_time(file)?;
        let mut outcome = UploadOutcome {
            file_name: name.clone(),
            remote_path: remote_path.clone(),
            status: UploadStatus::Uploaded,
            archived_to: None,
            error: None,
        };

        if uploaded.contains(&(name.clone(), file_timestamp)) {
            tracing::info!(file = %name, "already uploaded, archiving only");
            outcome.status = UploadStatus::AlreadyUploaded;
        } else {
            tracing::info!(file = %file.display(), remote = %remote_path, "uploading");
            if let Err(e) = session.put(file, &remote_path) {
                if e.is_fatal() {
                    return Err(e);
                }
                tracing::warn!(file = %name, error = %e, "upload failed");
                outcome.status = UploadStatus::Failed;
                outcome.error = Some(e.to_string());
                return Ok(outcome);
            }
            audit.append(&AuditRecord {
                remote_name: remote_path,
                local_path: name,
                file_timestamp,
                status: AuditStatus::Uploaded,
                recorded_at: local_time(self.run_at.with_timezone(&Utc)),
            })?;
        }

        let archived = nsc_fs::io::archive_move(
            file,
            &self.config.local.archive_path,
            &run_stamp(&self.run_at),
        )?;
        tracing::debug!(archived = %archived.display(), "archived");
        outcome.archived_to = Some(archived);
        Ok(outcome)
    }

    fn names(&self, file: &Path) -> (String, String) {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let remote_path = remote_join(&self.config.ftp.send_path, &name);
        (name, remote_path)
    }
}

/// Regular files in the outbox, sorted by name.
fn outbox_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| nsc_fs::Error::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| nsc_fs::Error::io(dir, e))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_time(path: &Path) -> Result<NaiveDateTime> {
    Ok(local_time(nsc_fs::io::modified_time(path)?))
}

/// `(file_name, file_timestamp)` of every `Uploaded` row already logged
fn uploaded_keys(log_file: &Path) -> Result<HashSet<(String, NaiveDateTime)>> {
    Ok(AuditLog::read(log_file)?
        .into_iter()
        .filter(|r| r.status == AuditStatus::Uploaded)
        .map(|r| (r.local_path, r.file_timestamp))
        .collect())
}
