//! Inbound run

use colored::Colorize;
use nsc_core::{
    CommandImporter, DirectoryConnector, FileStatus, ImportStatus, MarkerFile, ReceiveEngine,
    ReceiveReport, RuleCatalog, SyncOptions,
};

use crate::context::RunContext;
use crate::error::Result;

/// Run the receive command
///
/// Downloads everything newer than the watermark, renames it by the
/// configured rules, hands importable reports to the import command and
/// advances the watermark.
pub fn run_receive(ctx: &RunContext, dry_run: bool, json: bool) -> Result<()> {
    let nsc = &ctx.config.nsc;
    let catalog = RuleCatalog::from_mapping(&nsc.rename)?;
    let importer = nsc
        .import
        .as_ref()
        .map(|settings| {
            CommandImporter::from_settings(settings).map(|i| i.with_working_dir(&ctx.root))
        })
        .transpose()?;

    let _lock = if dry_run { None } else { Some(ctx.lock()?) };

    if !json {
        println!(
            "{} Receiving from {}{}",
            "=>".blue().bold(),
            nsc.ftp.endpoint().cyan(),
            if dry_run { " (dry run)" } else { "" }
        );
    }

    let mut engine =
        ReceiveEngine::new(nsc, &catalog).with_options(SyncOptions { dry_run });
    if let Some(importer) = &importer {
        engine = engine.with_importer(importer);
    }
    let mut marker = MarkerFile::in_dir(&nsc.local.receive_path);
    let report = engine.run(&DirectoryConnector::new(), &mut marker)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &ReceiveReport) {
    if report.files.is_empty() {
        println!(
            "{} No new files ({} listed).",
            "OK".green().bold(),
            report.listed
        );
        return;
    }

    for file in &report.files {
        let (mark, label) = match file.status {
            FileStatus::Planned => ("~".cyan(), "planned".cyan()),
            FileStatus::Downloaded => ("+".green(), "downloaded".green()),
            FileStatus::TransferFailed => ("!".red(), "failed".red()),
            FileStatus::Skipped => ("-".yellow(), "skipped".yellow()),
        };
        let rule = file.rule.as_deref().unwrap_or("identity");
        println!(
            "   {} {} -> {} ({}) {}",
            mark,
            file.remote_name,
            file.local_name.cyan(),
            rule.dimmed(),
            label
        );

        match &file.import {
            ImportStatus::NotRequested => {}
            ImportStatus::Planned => println!("     {} import planned", "~".cyan()),
            ImportStatus::Imported => println!("     {} imported", "+".green()),
            ImportStatus::AlreadyImported => {
                println!("     {} already imported", "=".blue())
            }
            ImportStatus::Failed { message } => {
                println!("     {} import failed: {}", "!".red(), message)
            }
        }
        if let Some(error) = &file.error {
            println!("     {}", error.dimmed());
        }
        if file.status == FileStatus::Downloaded && !file.timestamp_preserved {
            println!("     {} remote timestamp not preserved", "!".yellow());
        }
    }

    println!();
    let failed = report.count(FileStatus::TransferFailed);
    let summary = format!(
        "{} downloaded, {} imported, {} failed, {} skipped",
        report.count(FileStatus::Downloaded),
        report.imported(),
        failed + report.import_failures(),
        report.count(FileStatus::Skipped),
    );
    if report.dry_run {
        println!(
            "{} {} file(s) would be received.",
            "DRY RUN".cyan().bold(),
            report.count(FileStatus::Planned)
        );
    } else if failed > 0 || report.import_failures() > 0 {
        println!("{} {}", "PARTIAL".yellow().bold(), summary);
    } else {
        println!("{} {}", "OK".green().bold(), summary);
    }

    if let Some(watermark) = report.new_watermark {
        println!("   watermark advanced to {}", watermark.to_rfc3339().dimmed());
    }
}
