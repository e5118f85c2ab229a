//! Downstream import dispatch
//!
//! The import command is run directly with an explicit argument list;
//! no shell ever sees the filename.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::ImportSettings;
use crate::naming::{FieldSet, Template};
use crate::{Error, Result};

/// Template field holding the rule name
pub const ENTRY_FIELD: &str = "entry";
/// Template field holding the local file path
pub const FILE_FIELD: &str = "fn";
/// Template field holding the run timestamp (`YYYYMMDD_HHMMSS`)
pub const RUN_STAMP_FIELD: &str = "dt";

/// Everything the import command may reference
#[derive(Debug, Clone)]
pub struct ImportRequest<'a> {
    /// Name of the rule that matched
    pub entry: &'a str,
    pub file: &'a Path,
    pub run_stamp: &'a str,
    /// Resolved name fields
    pub fields: &'a FieldSet,
}

/// Result of one import invocation
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs the downstream import for one file
pub trait ImportDispatcher {
    /// # Errors
    ///
    /// Returns [`Error::ImportDispatch`] if the command cannot be built or
    /// started. A command that runs and exits non-zero is an unsuccessful
    /// [`ImportOutcome`], not an error.
    fn dispatch(&self, request: &ImportRequest<'_>) -> Result<ImportOutcome>;
}

/// Dispatches imports by running a configured program
#[derive(Debug, Clone)]
pub struct CommandImporter {
    program: Template,
    args: Vec<Template>,
    append_positional: bool,
    working_dir: Option<PathBuf>,
}

impl CommandImporter {
    /// Build from `nsc.import`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty command or a malformed
    /// token template.
    pub fn from_settings(settings: &ImportSettings) -> Result<Self> {
        let mut tokens = settings
            .cmd
            .tokens()
            .into_iter()
            .map(|t| {
                Template::parse(&t)
                    .map_err(|e| Error::config(format!("nsc.import.cmd: {}", e)))
            })
            .collect::<Result<Vec<_>>>()?;

        if tokens.is_empty() {
            return Err(Error::config("nsc.import.cmd must not be empty"));
        }
        let program = tokens.remove(0);

        let append_positional = ![ENTRY_FIELD, FILE_FIELD, RUN_STAMP_FIELD]
            .iter()
            .any(|f| program.references(f) || tokens.iter().any(|t| t.references(f)));

        Ok(Self {
            program,
            args: tokens,
            append_positional,
            working_dir: None,
        })
    }

    /// Run the command from `dir` instead of the current directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// The program and arguments for a request.
    pub fn argv(&self, request: &ImportRequest<'_>) -> Result<Vec<String>> {
        let mut vars = request.fields.clone();
        vars.insert(ENTRY_FIELD.into(), request.entry.to_string());
        vars.insert(FILE_FIELD.into(), request.file.display().to_string());
        vars.insert(RUN_STAMP_FIELD.into(), request.run_stamp.to_string());

        let render = |t: &Template| {
            t.render(&vars).map_err(|e| Error::ImportDispatch {
                entry: request.entry.to_string(),
                message: format!("cannot render '{}': {}", t, e),
            })
        };

        let mut argv = vec![render(&self.program)?];
        for arg in &self.args {
            argv.push(render(arg)?);
        }
        if self.append_positional {
            argv.push(vars[ENTRY_FIELD].clone());
            argv.push(vars[FILE_FIELD].clone());
            argv.push(vars[RUN_STAMP_FIELD].clone());
        }
        Ok(argv)
    }
}

impl ImportDispatcher for CommandImporter {
    fn dispatch(&self, request: &ImportRequest<'_>) -> Result<ImportOutcome> {
        let argv = self.argv(request)?;
        tracing::debug!(entry = request.entry, ?argv, "running import command");

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..]);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|e| Error::ImportDispatch {
            entry: request.entry.to_string(),
            message: format!("cannot start '{}': {}", argv[0], e),
        })?;

        Ok(ImportOutcome {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
