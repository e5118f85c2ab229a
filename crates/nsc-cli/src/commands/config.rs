//! Configuration display

use crate::context::RunContext;
use crate::error::Result;

/// Print the merged configuration with the password redacted
pub fn run_config_show(ctx: &RunContext, json: bool) -> Result<()> {
    let redacted = ctx.config.redacted();
    if json {
        println!("{}", serde_json::to_string_pretty(&redacted)?);
    } else {
        let yaml = serde_yaml::to_string(&redacted)
            .map_err(|e| crate::error::CliError::user(format!("Cannot render config: {}", e)))?;
        print!("{}", yaml);
    }
    Ok(())
}
