//! Configuration source discovery and merging
//!
//! Sources are merged in order, later ones overriding earlier ones:
//! 1. Base config (`<root>/Data/config.yml`)
//! 2. Local overrides (`<root>/Data/config.local.yml`)
//!
//! `<root>` is the nearest ancestor of the working directory that contains
//! the [`ROOT_MARKER`] file, or the working directory itself. Explicit
//! sources replace discovery entirely.

use std::path::{Path, PathBuf};

use nsc_fs::ConfigStore;

use super::settings::Config;
use crate::{Error, Result};

/// File whose presence marks the shared root directory
pub const ROOT_MARKER: &str = "_IERG_SHARED_ROOT_DIR_";

const BASE_CONFIG: &str = "Data/config.yml";
const LOCAL_CONFIG: &str = "Data/config.local.yml";

/// Resolves the configuration sources for a run
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    start: PathBuf,
    explicit: Vec<PathBuf>,
}

impl ConfigResolver {
    /// Discover sources starting from `start`
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            start: start.into(),
            explicit: Vec::new(),
        }
    }

    /// Use exactly these sources, in merge order
    pub fn with_sources(mut self, sources: impl IntoIterator<Item = PathBuf>) -> Self {
        self.explicit = sources.into_iter().collect();
        self
    }

    /// The nearest ancestor of the start directory holding [`ROOT_MARKER`].
    pub fn root(&self) -> PathBuf {
        find_root(&self.start, ROOT_MARKER).unwrap_or_else(|| self.start.clone())
    }

    /// Sources that will be merged, in order
    pub fn sources(&self) -> Vec<PathBuf> {
        if !self.explicit.is_empty() {
            return self.explicit.clone();
        }

        let root = self.root();
        [BASE_CONFIG, LOCAL_CONFIG]
            .iter()
            .map(|rel| root.join(rel))
            .filter(|path| {
                let present = path.is_file();
                if !present {
                    tracing::debug!(path = %path.display(), "config layer not found, skipping");
                }
                present
            })
            .collect()
    }

    /// Load and merge all sources into a validated [`Config`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no source exists, and propagates
    /// parse and validation failures.
    pub fn resolve(&self) -> Result<Config> {
        let sources = self.sources();
        if sources.is_empty() {
            return Err(Error::config(format!(
                "no configuration found (looked for {} under {})",
                BASE_CONFIG,
                self.root().display()
            )));
        }

        let store = sources
            .into_iter()
            .fold(ConfigStore::new(), |store, path| store.with_source(path));
        let merged = store.load_value()?;
        Config::from_value(merged)
    }
}

fn find_root(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).exists())
        .map(Path::to_path_buf)
}
