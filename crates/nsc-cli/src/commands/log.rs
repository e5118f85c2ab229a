//! Audit log viewer

use colored::Colorize;
use nsc_core::{AuditLog, AuditStatus};

use crate::context::RunContext;
use crate::error::Result;

/// Print audit rows, optionally filtered by status
pub fn run_log(
    ctx: &RunContext,
    status: Option<AuditStatus>,
    outbound: bool,
    json: bool,
) -> Result<()> {
    let local = &ctx.config.nsc.local;
    let path = if outbound {
        local.outbound_log_file()
    } else {
        local.log_file.as_path()
    };

    let records: Vec<_> = AuditLog::read(path)?
        .into_iter()
        .filter(|r| status.is_none_or(|s| r.status == s))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{}", "(no entries)".dimmed());
        return Ok(());
    }

    for record in &records {
        let status = match record.status {
            AuditStatus::Downloaded => record.status.as_str().green(),
            AuditStatus::Imported => record.status.as_str().blue(),
            AuditStatus::Uploaded => record.status.as_str().cyan(),
        };
        println!(
            "{}  {:<10}  {} -> {}",
            record.recorded_at.to_string().dimmed(),
            status,
            record.remote_name,
            record.local_path
        );
    }
    Ok(())
}
