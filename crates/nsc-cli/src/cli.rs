//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use nsc_core::AuditStatus;

/// NSC file exchange - incremental receive, rename, import and send
#[derive(Parser, Debug)]
#[command(name = "nsc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file; repeat to layer files, later ones win.
    /// Replaces discovery of Data/config.yml under the shared root.
    #[arg(short, long = "config", global = true, env = "NSC_CONFIG")]
    pub config: Vec<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Download files newer than the watermark, rename and import them
    ///
    /// Examples:
    ///   nsc receive             # Run the inbound direction
    ///   nsc receive --dry-run   # Show what would be downloaded and how it would be named
    Receive {
        /// Preview without transferring, logging or moving the watermark
        #[arg(long)]
        dry_run: bool,

        /// Output the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Upload every outbox file, then archive it
    Send {
        /// Preview without uploading or archiving
        #[arg(long)]
        dry_run: bool,

        /// Output the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how remote filenames would be decomposed and renamed
    Resolve {
        /// Remote filenames to resolve
        #[arg(required = true)]
        names: Vec<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Read the audit log
    Log {
        /// Only show rows with this status
        #[arg(long, value_enum, ignore_case = true)]
        status: Option<StatusFilter>,

        /// Read the outbound log instead of the inbound one
        #[arg(long)]
        outbound: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Print the merged configuration with secrets redacted
    Config {
        /// Output as JSON instead of YAML
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Audit status accepted by `nsc log --status`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Downloaded,
    Imported,
    Uploaded,
}

impl From<StatusFilter> for AuditStatus {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::Downloaded => AuditStatus::Downloaded,
            StatusFilter::Imported => AuditStatus::Imported,
            StatusFilter::Uploaded => AuditStatus::Uploaded,
        }
    }
}
