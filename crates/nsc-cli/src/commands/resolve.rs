//! Offline rule resolution

use colored::Colorize;
use nsc_core::{RuleCatalog, decompose};

use crate::context::RunContext;
use crate::error::Result;

/// Show how each name decomposes and which local name it would get
pub fn run_resolve(ctx: &RunContext, names: &[String], json: bool) -> Result<()> {
    let nsc = &ctx.config.nsc;
    let catalog = RuleCatalog::from_mapping(&nsc.rename)?;

    let mut results = Vec::with_capacity(names.len());
    for name in names {
        let decomposed = decompose(name);
        let resolution = catalog.resolve(&decomposed, nsc.importable_type())?;
        results.push((decomposed, resolution));
    }

    if json {
        let output: Vec<_> = results
            .iter()
            .map(|(decomposed, resolution)| {
                serde_json::json!({
                    "name": decomposed.raw,
                    "structured": decomposed.is_structured(),
                    "decomposed": decomposed,
                    "rule": resolution.rule,
                    "local_name": resolution.local_name,
                    "import": resolution.should_import,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for (decomposed, resolution) in &results {
        println!("{}", decomposed.raw.bold());
        if decomposed.is_structured() {
            println!(
                "  {:<8} {} / {}",
                "type:".dimmed(),
                decomposed.report_type,
                decomposed.mode
            );
        } else {
            println!("  {:<8} {}", "type:".dimmed(), "(unstructured)".dimmed());
        }
        println!(
            "  {:<8} {}",
            "rule:".dimmed(),
            resolution.rule.as_deref().unwrap_or("(identity)")
        );
        println!("  {:<8} {}", "local:".dimmed(), resolution.local_name.cyan());
        println!(
            "  {:<8} {}",
            "import:".dimmed(),
            if resolution.should_import {
                "yes".green()
            } else {
                "no".normal()
            }
        );
    }
    Ok(())
}
