//! Configuration model and source resolution
//!
//! The configuration is a single `nsc:` document, optionally split across
//! a base file and an override file that are deep-merged before use.

mod resolver;
mod settings;

pub use resolver::{ConfigResolver, ROOT_MARKER};
pub use settings::{
    Config, FtpSettings, ImportCommand, ImportSettings, LocalSettings, NscConfig, RuleSpec,
};
