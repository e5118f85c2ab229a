//! The ordered collection of rename rules

use serde_yaml::Mapping;

use super::rule::RenameRule;
use crate::config::RuleSpec;
use crate::{Error, Result};

/// Rename rules in declaration order
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    rules: Vec<RenameRule>,
}

impl RuleCatalog {
    /// Create a catalog from already compiled rules
    pub fn new(rules: Vec<RenameRule>) -> Self {
        Self { rules }
    }

    /// Compile the `nsc.rename` mapping, preserving its key order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a non-string key, a malformed entry,
    /// or a rule that fails to compile.
    pub fn from_mapping(rename: &Mapping) -> Result<Self> {
        let mut rules = Vec::with_capacity(rename.len());

        for (key, value) in rename {
            let name = key
                .as_str()
                .ok_or_else(|| Error::config(format!("rename rule key {:?} is not a string", key)))?;
            let spec: RuleSpec = serde_yaml::from_value(value.clone())
                .map_err(|e| Error::config(format!("rename rule '{}': {}", name, e)))?;
            rules.push(RenameRule::compile(name, &spec)?);
        }

        tracing::debug!(count = rules.len(), "rename rules loaded");
        Ok(Self { rules })
    }

    /// All rules, in evaluation order
    pub fn rules(&self) -> &[RenameRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
