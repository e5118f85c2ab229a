//! Sync orchestration
//!
//! - **receive**: list the remote directory, keep entries newer than the
//!   watermark, rename, download, stamp, audit, import, then commit the
//!   watermark once for the whole batch
//! - **send**: upload every outbox file, audit it, archive it
//!
//! Runs are sequential and assume no concurrent run on the same
//! directories; callers provide mutual exclusion.

mod receive;
mod report;
mod send;

pub use receive::ReceiveEngine;
pub use report::{
    FileOutcome, FileStatus, ImportStatus, ReceiveReport, SendReport, UploadOutcome, UploadStatus,
};
pub use send::SendEngine;

use chrono::{DateTime, Local, NaiveDateTime, SubsecRound, Utc};

/// Options for receive and send runs
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Resolve and report without transferring, logging, importing or
    /// touching the watermark.
    pub dry_run: bool,
}

/// Run timestamp as passed to the import command and used for archive
/// suffixes.
pub fn run_stamp(run_at: &DateTime<Local>) -> String {
    run_at.format("%Y%m%d_%H%M%S").to_string()
}

/// Local wall-clock time at second precision, as recorded in the audit log
pub(crate) fn local_time(at: DateTime<Utc>) -> NaiveDateTime {
    at.with_timezone(&Local).naive_local().trunc_subsecs(0)
}
