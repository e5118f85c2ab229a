//! Append-only CSV audit trail
//!
//! One row per event. Inbound events (`Downloaded`, `Imported`) are laid
//! out as `nsc_file_name, local_file_name, ...`; outbound events
//! (`Uploaded`) as `file_name, remote_file, ...`. The header is written
//! only when the file is created, and rows are never rewritten.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{Error, Result};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const INBOUND_HEADER: [&str; 5] = [
    "nsc_file_name",
    "local_file_name",
    "file_date_time",
    "status",
    "date_time",
];
const OUTBOUND_HEADER: [&str; 5] = [
    "file_name",
    "remote_file",
    "file_date_time",
    "status",
    "date_time",
];

/// Transfer direction, which decides the header of a new log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AuditStatus {
    Downloaded,
    Imported,
    Uploaded,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Downloaded => "Downloaded",
            Self::Imported => "Imported",
            Self::Uploaded => "Uploaded",
        }
    }

    fn direction(&self) -> Direction {
        match self {
            Self::Downloaded | Self::Imported => Direction::Inbound,
            Self::Uploaded => Direction::Outbound,
        }
    }
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Downloaded" => Ok(Self::Downloaded),
            "Imported" => Ok(Self::Imported),
            "Uploaded" => Ok(Self::Uploaded),
            other => Err(format!("unknown audit status '{}'", other)),
        }
    }
}

/// One immutable audit row
///
/// Times are local wall-clock times, second precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    pub remote_name: String,
    pub local_path: String,
    pub file_timestamp: NaiveDateTime,
    pub status: AuditStatus,
    pub recorded_at: NaiveDateTime,
}

impl AuditRecord {
    fn to_row(&self) -> [String; 5] {
        let (first, second) = match self.status.direction() {
            Direction::Inbound => (&self.remote_name, &self.local_path),
            Direction::Outbound => (&self.local_path, &self.remote_name),
        };
        [
            first.clone(),
            second.clone(),
            self.file_timestamp.format(TIME_FORMAT).to_string(),
            self.status.to_string(),
            self.recorded_at.format(TIME_FORMAT).to_string(),
        ]
    }

    fn from_row(row: &csv::StringRecord) -> Option<Self> {
        let status: AuditStatus = row.get(3)?.trim().parse().ok()?;
        let (first, second) = (row.get(0)?.to_string(), row.get(1)?.to_string());
        let (remote_name, local_path) = match status.direction() {
            Direction::Inbound => (first, second),
            Direction::Outbound => (second, first),
        };
        Some(Self {
            remote_name,
            local_path,
            file_timestamp: parse_time(row.get(2)?)?,
            status,
            recorded_at: parse_time(row.get(4)?)?,
        })
    }
}

/// Append handle on an audit log file
pub struct AuditLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl AuditLog {
    /// Open `path` for appending, writing the header if the file is new.
    pub fn open(path: &Path, direction: Direction) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            nsc_fs::io::ensure_dir(parent)?;
        }

        let is_new = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut log = Self {
            path: path.to_path_buf(),
            writer: csv::WriterBuilder::new().has_headers(false).from_writer(file),
        };

        if is_new {
            let header = match direction {
                Direction::Inbound => INBOUND_HEADER,
                Direction::Outbound => OUTBOUND_HEADER,
            };
            log.write_row(&header)?;
        }
        Ok(log)
    }

    /// Append one record and flush it to disk.
    pub fn append(&mut self, record: &AuditRecord) -> Result<()> {
        self.write_row(&record.to_row())?;
        tracing::debug!(
            status = %record.status,
            remote = %record.remote_name,
            local = %record.local_path,
            "audit record appended"
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record of an audit log. A missing file has no records.
    ///
    /// Rows that cannot be interpreted are skipped with a warning.
    pub fn read(path: &Path) -> Result<Vec<AuditRecord>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|source| audit_error(path, source))?;

        let mut records = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row.map_err(|source| audit_error(path, source))?;
            match AuditRecord::from_row(&row) {
                Some(record) => records.push(record),
                None => tracing::warn!(
                    path = %path.display(),
                    line = index + 2,
                    "skipping unreadable audit row"
                ),
            }
        }
        Ok(records)
    }

    fn write_row<I, T>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let path = self.path.clone();
        self.writer
            .write_record(row)
            .map_err(|source| audit_error(&path, source))?;
        self.writer.flush()?;
        Ok(())
    }
}

fn audit_error(path: &Path, source: csv::Error) -> Error {
    Error::Audit {
        path: path.to_path_buf(),
        source,
    }
}

/// Parse a logged time, tolerating fractional seconds.
fn parse_time(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%d %H:%M:%S%.f").ok()
}
