//! First-match rule resolution and local name synthesis

use serde::Serialize;

use super::catalog::RuleCatalog;
use crate::naming::{DecomposedName, FieldSet};
use crate::Result;

/// Outcome of resolving one remote filename
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Canonical local filename
    pub local_name: String,
    /// Name of the winning rule; `None` means identity fallback
    pub rule: Option<String>,
    /// Whether the file should be handed to the import command
    pub should_import: bool,
    /// Fields available to the import command
    pub fields: FieldSet,
}

impl Resolution {
    fn identity(decomposed: &DecomposedName) -> Self {
        Self {
            local_name: decomposed.raw.clone(),
            rule: None,
            should_import: false,
            fields: decomposed.fields(),
        }
    }

    /// Whether no rule applied and the remote name was kept
    pub fn is_identity(&self) -> bool {
        self.rule.is_none()
    }
}

impl RuleCatalog {
    /// Resolve the local name and import decision for a decomposed name.
    ///
    /// Rules are tried in declaration order. A rule whose mode filter or
    /// pattern rejects the name is skipped and evaluation continues; the
    /// first rule that accepts wins. When nothing accepts, or the name is
    /// unstructured, the remote name is kept and nothing is imported.
    ///
    /// Import is requested only when the winning rule is importable and
    /// the report type equals `importable_type`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::RuleTemplate`] if the winning rule's
    /// template references a field with no value.
    pub fn resolve(
        &self,
        decomposed: &DecomposedName,
        importable_type: Option<&str>,
    ) -> Result<Resolution> {
        if !decomposed.is_structured() {
            return Ok(Resolution::identity(decomposed));
        }

        for rule in self.rules() {
            let Some(fields) = rule.accept(decomposed) else {
                tracing::trace!(rule = %rule.name, name = %decomposed.raw, "rule skipped");
                continue;
            };

            let local_name = rule.render(&fields)?;
            let should_import =
                rule.importable && importable_type == Some(decomposed.report_type.as_str());

            return Ok(Resolution {
                local_name,
                rule: Some(rule.name.clone()),
                should_import,
                fields,
            });
        }

        Ok(Resolution::identity(decomposed))
    }
}
