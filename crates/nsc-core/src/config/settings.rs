//! Typed view of the `nsc:` configuration document

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Mapping;

use crate::{Error, Result};

/// Root of the configuration document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub nsc: NscConfig,
}

/// The `nsc:` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NscConfig {
    pub ftp: FtpSettings,
    pub local: LocalSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<ImportSettings>,
    /// Rename rules in declaration order. Kept as a raw mapping so the
    /// order survives deserialization; see [`crate::rules::RuleCatalog`].
    #[serde(default)]
    pub rename: Mapping,
}

/// Remote endpoint settings (`nsc.ftp`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FtpSettings {
    pub host: String,
    #[serde(default = "default_port", deserialize_with = "port_from_any")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Remote directory holding files to receive
    pub receive_path: String,
    /// Remote directory that accepts uploads
    pub send_path: String,
    /// Local directory mirroring the remote endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount: Option<PathBuf>,
}

impl FtpSettings {
    /// `user@host:port`, for logs and errors
    pub fn endpoint(&self) -> String {
        if self.username.is_empty() {
            format!("{}:{}", self.host, self.port)
        } else {
            format!("{}@{}:{}", self.username, self.host, self.port)
        }
    }
}

/// Local filesystem settings (`nsc.local`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSettings {
    pub receive_path: PathBuf,
    pub send_path: PathBuf,
    pub archive_path: PathBuf,
    pub log_file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_log_file: Option<PathBuf>,
}

impl LocalSettings {
    /// Audit log used by the outbound direction
    pub fn outbound_log_file(&self) -> &Path {
        self.send_log_file.as_deref().unwrap_or(&self.log_file)
    }
}

/// Downstream import settings (`nsc.import`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSettings {
    /// The single report type eligible for import
    #[serde(rename = "type")]
    pub report_type: String,
    pub cmd: ImportCommand,
}

/// The import command, as one line or as explicit argv tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ImportCommand {
    Line(String),
    Argv(Vec<String>),
}

impl ImportCommand {
    /// Argv tokens; a single line is split on whitespace, never through a shell.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            Self::Line(line) => line.split_whitespace().map(str::to_string).collect(),
            Self::Argv(argv) => argv.clone(),
        }
    }
}

/// One entry under `nsc.rename`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub replace: String,
    #[serde(default, rename = "import")]
    pub importable: bool,
}

impl Config {
    /// Parse a configuration document from YAML text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.nsc.validate()?;
        Ok(config)
    }

    /// Deserialize a configuration from an already merged YAML value.
    pub fn from_value(value: serde_yaml::Value) -> Result<Self> {
        if value.is_null() {
            return Err(Error::config("configuration is empty"));
        }
        let config: Self = serde_yaml::from_value(value)
            .map_err(|e| Error::config(format!("invalid configuration: {}", e)))?;
        config.nsc.validate()?;
        Ok(config)
    }

    /// Copy with the password replaced, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.nsc.ftp.password.is_empty() {
            copy.nsc.ftp.password = "********".to_string();
        }
        copy
    }
}

impl NscConfig {
    /// Check required values that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.ftp.host.trim().is_empty() {
            return Err(Error::config("nsc.ftp.host must not be empty"));
        }
        if let Some(import) = &self.import {
            if import.report_type.trim().is_empty() {
                return Err(Error::config("nsc.import.type must not be empty"));
            }
            if import.cmd.tokens().is_empty() {
                return Err(Error::config("nsc.import.cmd must not be empty"));
            }
        }
        Ok(())
    }

    /// The configured importable report type, if imports are enabled
    pub fn importable_type(&self) -> Option<&str> {
        self.import.as_ref().map(|i| i.report_type.as_str())
    }
}

fn default_port() -> u16 {
    22
}

fn port_from_any<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid port '{}'", text))),
    }
}
