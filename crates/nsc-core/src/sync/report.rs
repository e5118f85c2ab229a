//! Run reports

use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// What happened to one retained remote entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileStatus {
    /// Dry run: would be downloaded
    Planned,
    Downloaded,
    /// The transfer failed; the file will be retried next run
    TransferFailed,
    /// Not attempted because the resolved name is unusable
    Skipped,
}

/// Import state of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ImportStatus {
    NotRequested,
    /// Dry run: would be imported
    Planned,
    Imported,
    /// An earlier run already imported this file version
    AlreadyImported,
    Failed { message: String },
}

/// Per-file result of a receive run
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub remote_name: String,
    pub modified_at: DateTime<Utc>,
    /// Whether the name followed the naming grammar
    pub structured: bool,
    pub rule: Option<String>,
    pub local_name: String,
    pub local_path: Option<PathBuf>,
    pub status: FileStatus,
    pub timestamp_preserved: bool,
    pub import: ImportStatus,
    pub error: Option<String>,
}

/// Result of a receive run
#[derive(Debug, Clone, Serialize)]
pub struct ReceiveReport {
    pub run_at: NaiveDateTime,
    pub dry_run: bool,
    /// Entries in the remote listing
    pub listed: usize,
    pub previous_watermark: Option<DateTime<Utc>>,
    /// Watermark written by this run, if it advanced
    pub new_watermark: Option<DateTime<Utc>>,
    /// One outcome per entry newer than the previous watermark
    pub files: Vec<FileOutcome>,
}

impl ReceiveReport {
    pub fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    pub fn imported(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.import == ImportStatus::Imported)
            .count()
    }

    pub fn import_failures(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.import, ImportStatus::Failed { .. }))
            .count()
    }
}

/// What happened to one outbox file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadStatus {
    /// Dry run: would be uploaded
    Planned,
    Uploaded,
    /// An earlier run uploaded and logged it; only the archive move ran
    AlreadyUploaded,
    Failed,
}

/// Per-file result of a send run
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub file_name: String,
    pub remote_path: String,
    pub status: UploadStatus,
    pub archived_to: Option<PathBuf>,
    pub error: Option<String>,
}

/// Result of a send run
#[derive(Debug, Clone, Serialize)]
pub struct SendReport {
    pub run_at: NaiveDateTime,
    pub dry_run: bool,
    pub files: Vec<UploadOutcome>,
}

impl SendReport {
    pub fn count(&self, status: UploadStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }
}
