//! Inbound run: remote listing to renamed, stamped, audited local files

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use nsc_fs::LOCK_FILE_NAME;

use super::report::{FileOutcome, FileStatus, ImportStatus, ReceiveReport};
use super::{SyncOptions, local_time, run_stamp};
use crate::audit::{AuditLog, AuditRecord, AuditStatus, Direction};
use crate::config::NscConfig;
use crate::import::{ImportDispatcher, ImportRequest};
use crate::naming::decompose;
use crate::remote::{Connector, RemoteEntry, RemoteSession, remote_join};
use crate::rules::{Resolution, RuleCatalog};
use crate::watermark::{MARKER_FILE_NAME, WatermarkStore};
use crate::{Error, Result};

/// Drives one inbound run
pub struct ReceiveEngine<'a> {
    config: &'a NscConfig,
    catalog: &'a RuleCatalog,
    importer: Option<&'a dyn ImportDispatcher>,
    options: SyncOptions,
    run_at: DateTime<Local>,
}

impl<'a> ReceiveEngine<'a> {
    pub fn new(config: &'a NscConfig, catalog: &'a RuleCatalog) -> Self {
        Self {
            config,
            catalog,
            importer: None,
            options: SyncOptions::default(),
            run_at: Local::now(),
        }
    }

    /// Dispatch imports through `importer`
    pub fn with_importer(mut self, importer: &'a dyn ImportDispatcher) -> Self {
        self.importer = Some(importer);
        self
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Fix the run time (audit `date_time` column and import `dt` value)
    pub fn with_run_time(mut self, run_at: DateTime<Local>) -> Self {
        self.run_at = run_at;
        self
    }

    /// Execute the run.
    ///
    /// Per-file transfer, naming and import failures are recorded in the
    /// report and do not stop the batch. Configuration, connection,
    /// listing, template and audit failures abort the run before the
    /// watermark is touched.
    pub fn run(
        &self,
        connector: &dyn Connector,
        store: &mut dyn WatermarkStore,
    ) -> Result<ReceiveReport> {
        let previous = store.read()?;
        tracing::info!(
            watermark = ?previous,
            dry_run = self.options.dry_run,
            "starting receive run"
        );

        let mut session = connector.connect(&self.config.ftp)?;
        let batch = self.process_batch(session.as_mut(), previous);
        if let Err(e) = session.close() {
            tracing::warn!(error = %e, "closing remote session failed");
        }
        let (listed, files) = batch?;

        let new_watermark = if self.options.dry_run {
            None
        } else {
            watermark_candidate(&files).filter(|c| previous.is_none_or(|p| *c > p))
        };
        if let Some(watermark) = new_watermark {
            store.write(watermark)?;
        }

        Ok(ReceiveReport {
            run_at: local_time(self.run_at.with_timezone(&Utc)),
            dry_run: self.options.dry_run,
            listed,
            previous_watermark: previous,
            new_watermark,
            files,
        })
    }

    fn process_batch(
        &self,
        session: &mut dyn RemoteSession,
        previous: Option<DateTime<Utc>>,
    ) -> Result<(usize, Vec<FileOutcome>)> {
        let entries = session.list(&self.config.ftp.receive_path)?;
        let listed = entries.len();

        let retained: Vec<RemoteEntry> = entries
            .into_iter()
            .filter(|e| previous.is_none_or(|p| e.modified_at > p))
            .collect();
        tracing::info!(listed, new = retained.len(), "remote listing filtered");

        let mut imported = imported_keys(&self.config.local.log_file)?;
        let mut audit = if self.options.dry_run {
            None
        } else {
            nsc_fs::io::ensure_dir(&self.config.local.receive_path)?;
            Some(AuditLog::open(&self.config.local.log_file, Direction::Inbound)?)
        };

        let mut files = Vec::with_capacity(retained.len());
        for entry in &retained {
            let outcome = match audit.as_mut() {
                Some(audit) => self.receive_entry(session, entry, audit, &mut imported)?,
                None => {
                    let (mut outcome, _) = self.plan_entry(entry)?;
                    if outcome.import == ImportStatus::Planned
                        && imported.contains(&import_key(entry))
                    {
                        outcome.import = ImportStatus::AlreadyImported;
                    }
                    outcome
                }
            };
            files.push(outcome);
        }
        Ok((listed, files))
    }

    /// Decompose, resolve and place one entry without touching anything.
    fn plan_entry(&self, entry: &RemoteEntry) -> Result<(FileOutcome, Resolution)> {
        let decomposed = decompose(&entry.name);
        if !decomposed.is_structured() {
            tracing::info!(remote = %entry.name, "name has no NSC structure, keeping remote name");
        }

        let resolution = self
            .catalog
            .resolve(&decomposed, self.config.importable_type())?;

        let mut outcome = FileOutcome {
            remote_name: entry.name.clone(),
            modified_at: entry.modified_at,
            structured: decomposed.is_structured(),
            rule: resolution.rule.clone(),
            local_name: resolution.local_name.clone(),
            local_path: None,
            status: FileStatus::Planned,
            timestamp_preserved: false,
            import: if resolution.should_import {
                ImportStatus::Planned
            } else {
                ImportStatus::NotRequested
            },
            error: None,
        };

        match local_target(&self.config.local.receive_path, &resolution.local_name) {
            Ok(path) => outcome.local_path = Some(path),
            Err(e) => {
                tracing::warn!(remote = %entry.name, error = %e, "skipping file");
                outcome.status = FileStatus::Skipped;
                outcome.import = ImportStatus::NotRequested;
                outcome.error = Some(e.to_string());
            }
        }

        Ok((outcome, resolution))
    }

    fn receive_entry(
        &self,
        session: &mut dyn RemoteSession,
        entry: &RemoteEntry,
        audit: &mut AuditLog,
        imported: &mut HashSet<(String, NaiveDateTime)>,
    ) -> Result<FileOutcome> {
        let (mut outcome, resolution) = self.plan_entry(entry)?;
        let Some(local_path) = outcome.local_path.clone() else {
            return Ok(outcome);
        };
        outcome.import = ImportStatus::NotRequested;

        let remote_path = remote_join(&self.config.ftp.receive_path, &entry.name);
        tracing::info!(
            remote = %entry.name,
            local = %local_path.display(),
            modified = %entry.modified_at,
            "downloading"
        );
        if let Err(e) = session.get(&remote_path, &local_path) {
            if e.is_fatal() {
                return Err(e);
            }
            tracing::warn!(remote = %entry.name, error = %e, "download failed");
            outcome.status = FileStatus::TransferFailed;
            outcome.error = Some(e.to_string());
            return Ok(outcome);
        }
        outcome.status = FileStatus::Downloaded;

        let accessed = entry.accessed_at.unwrap_or(entry.modified_at);
        match nsc_fs::io::set_times(&local_path, entry.modified_at, accessed) {
            Ok(()) => outcome.timestamp_preserved = true,
            Err(e) => tracing::warn!(
                local = %local_path.display(),
                error = %e,
                "could not preserve remote timestamps"
            ),
        }

        audit.append(&self.record(entry, &local_path, AuditStatus::Downloaded))?;

        if resolution.should_import {
            let key = import_key(entry);
            outcome.import = if imported.contains(&key) {
                tracing::info!(remote = %entry.name, "already imported, not dispatching again");
                ImportStatus::AlreadyImported
            } else {
                let status = self.import(entry, &resolution, &local_path, audit)?;
                if status == ImportStatus::Imported {
                    imported.insert(key);
                }
                status
            };
        }
        Ok(outcome)
    }

    fn import(
        &self,
        entry: &RemoteEntry,
        resolution: &Resolution,
        local_path: &Path,
        audit: &mut AuditLog,
    ) -> Result<ImportStatus> {
        let Some(importer) = self.importer else {
            tracing::warn!(remote = %entry.name, "import requested but no importer configured");
            return Ok(ImportStatus::Failed {
                message: "no import command configured".into(),
            });
        };

        let stamp = run_stamp(&self.run_at);
        let request = ImportRequest {
            entry: resolution.rule.as_deref().unwrap_or_default(),
            file: local_path,
            run_stamp: &stamp,
            fields: &resolution.fields,
        };

        match importer.dispatch(&request) {
            Ok(result) if result.success => {
                audit.append(&self.record(entry, local_path, AuditStatus::Imported))?;
                tracing::info!(local = %local_path.display(), "imported");
                Ok(ImportStatus::Imported)
            }
            Ok(result) => {
                tracing::warn!(
                    local = %local_path.display(),
                    exit_code = ?result.exit_code,
                    stderr = %result.stderr.trim(),
                    "import command failed"
                );
                Ok(ImportStatus::Failed {
                    message: match result.exit_code {
                        Some(code) => format!("exit code {}", code),
                        None => "terminated by signal".into(),
                    },
                })
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::warn!(local = %local_path.display(), error = %e, "import dispatch failed");
                Ok(ImportStatus::Failed {
                    message: e.to_string(),
                })
            }
        }
    }

    fn record(&self, entry: &RemoteEntry, local_path: &Path, status: AuditStatus) -> AuditRecord {
        AuditRecord {
            remote_name: entry.name.clone(),
            local_path: local_path.display().to_string(),
            file_timestamp: local_time(entry.modified_at),
            status,
            recorded_at: local_time(self.run_at.with_timezone(&Utc)),
        }
    }
}

/// `(nsc_file_name, file_timestamp)` of every `Imported` row already logged
fn imported_keys(log_file: &Path) -> Result<HashSet<(String, NaiveDateTime)>> {
    Ok(AuditLog::read(log_file)?
        .into_iter()
        .filter(|r| r.status == AuditStatus::Imported)
        .map(|r| (r.remote_name, r.file_timestamp))
        .collect())
}

fn import_key(entry: &RemoteEntry) -> (String, NaiveDateTime) {
    (entry.name.clone(), local_time(entry.modified_at))
}

/// The watermark a finished batch may commit.
///
/// The newest processed entry that is strictly older than the oldest
/// failed transfer, so a failed file stays above the watermark and is
/// retried. `None` when nothing qualifies.
pub(crate) fn watermark_candidate(files: &[FileOutcome]) -> Option<DateTime<Utc>> {
    let oldest_failure = files
        .iter()
        .filter(|f| f.status == FileStatus::TransferFailed)
        .map(|f| f.modified_at)
        .min();

    files
        .iter()
        .filter(|f| matches!(f.status, FileStatus::Downloaded | FileStatus::Skipped))
        .map(|f| f.modified_at)
        .filter(|at| oldest_failure.is_none_or(|oldest| *at < oldest))
        .max()
}

/// Join a synthesized name onto the receive directory.
///
/// Names may contain subdirectories but must stay inside the directory
/// and must not clobber the watermark marker or the run lock.
fn local_target(receive_dir: &Path, local_name: &str) -> Result<PathBuf> {
    let relative = Path::new(local_name);
    let valid = !local_name.is_empty()
        && local_name != MARKER_FILE_NAME
        && local_name != LOCK_FILE_NAME
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

    if !valid {
        return Err(Error::InvalidLocalName {
            name: local_name.to_string(),
        });
    }
    Ok(receive_dir.join(relative))
}
