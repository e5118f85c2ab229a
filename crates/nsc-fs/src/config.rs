//! Layered YAML configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::{Error, Result};

/// Loads one or more YAML sources and deep-merges them in order.
///
/// Mappings merge recursively. Scalars and sequences from a later source
/// replace the earlier value wholesale. Keys already present keep their
/// original position, which matters for order-sensitive sections.
#[derive(Debug, Default, Clone)]
pub struct ConfigStore {
    sources: Vec<PathBuf>,
}

impl ConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source; later sources override earlier ones.
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(path.into());
        self
    }

    /// The sources in merge order
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Load and merge every source into a single YAML value.
    ///
    /// # Errors
    ///
    /// Fails if any source is missing or is not valid YAML.
    pub fn load_value(&self) -> Result<Value> {
        let mut merged = Value::Null;
        for path in &self.sources {
            let value = read_yaml(path)?;
            tracing::debug!(path = %path.display(), "merging config source");
            merge_values(&mut merged, value);
        }
        Ok(merged)
    }
}

/// Deep-merge `overlay` into `base`.
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => {
            // A null overlay (e.g. an empty file) leaves the base untouched
            if !overlay.is_null() {
                *base = overlay;
            }
        }
    }
}

fn read_yaml(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_yaml::from_str(&content).map_err(|e| Error::ConfigParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
