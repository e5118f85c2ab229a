//! Outbound run

use colored::Colorize;
use nsc_core::{DirectoryConnector, SendEngine, SendReport, SyncOptions, UploadStatus};

use crate::context::RunContext;
use crate::error::Result;

/// Run the send command
pub fn run_send(ctx: &RunContext, dry_run: bool, json: bool) -> Result<()> {
    let nsc = &ctx.config.nsc;
    let _lock = if dry_run { None } else { Some(ctx.lock()?) };

    if !json {
        println!(
            "{} Sending {} to {}{}",
            "=>".blue().bold(),
            nsc.local.send_path.display(),
            nsc.ftp.endpoint().cyan(),
            if dry_run { " (dry run)" } else { "" }
        );
    }

    let report = SendEngine::new(nsc)
        .with_options(SyncOptions { dry_run })
        .run(&DirectoryConnector::new())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &SendReport) {
    if report.files.is_empty() {
        println!("{} No files to send.", "OK".green().bold());
        return;
    }

    for file in &report.files {
        let mark = match file.status {
            UploadStatus::Planned => "~".cyan(),
            UploadStatus::Uploaded => "+".green(),
            UploadStatus::AlreadyUploaded => "=".blue(),
            UploadStatus::Failed => "!".red(),
        };
        println!("   {} {} -> {}", mark, file.file_name, file.remote_path.cyan());
        if let Some(archived) = &file.archived_to {
            println!("     archived as {}", archived.display().to_string().dimmed());
        }
        if let Some(error) = &file.error {
            println!("     {}", error.red());
        }
    }

    println!();
    let failed = report.count(UploadStatus::Failed);
    if report.dry_run {
        println!(
            "{} {} file(s) would be sent.",
            "DRY RUN".cyan().bold(),
            report.count(UploadStatus::Planned)
        );
    } else if failed > 0 {
        println!(
            "{} {} uploaded, {} failed and left in the outbox",
            "PARTIAL".yellow().bold(),
            report.count(UploadStatus::Uploaded),
            failed
        );
    } else {
        println!(
            "{} {} uploaded, {} archived after an earlier upload",
            "OK".green().bold(),
            report.count(UploadStatus::Uploaded),
            report.count(UploadStatus::AlreadyUploaded)
        );
    }
}
