//! NSC file exchange CLI
//!
//! Scheduled entry point for the inbound (`receive`) and outbound (`send`)
//! directions, plus read-only helpers for rules, the audit log and the
//! merged configuration.

mod cli;
mod commands;
mod context;
mod error;

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::RunContext;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(cmd) => execute_command(cmd, &cli.config),
        None => {
            println!("{} NSC file exchange", "nsc".green().bold());
            println!();
            println!("Run {} for available commands.", "nsc --help".cyan());
            Ok(())
        }
    }
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("Verbose mode enabled");
}

fn execute_command(cmd: Commands, sources: &[PathBuf]) -> Result<()> {
    match cmd {
        Commands::Receive { dry_run, json } => {
            commands::run_receive(&load(sources)?, dry_run, json)
        }
        Commands::Send { dry_run, json } => commands::run_send(&load(sources)?, dry_run, json),
        Commands::Resolve { names, json } => {
            commands::run_resolve(&load(sources)?, &names, json)
        }
        Commands::Log {
            status,
            outbound,
            json,
        } => commands::run_log(&load(sources)?, status.map(Into::into), outbound, json),
        Commands::Config { json } => commands::run_config_show(&load(sources)?, json),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "nsc", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn load(sources: &[PathBuf]) -> Result<RunContext> {
    let cwd = std::env::current_dir()?;
    RunContext::load(&cwd, sources)
}
