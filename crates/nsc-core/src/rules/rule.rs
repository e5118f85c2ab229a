//! A single compiled rename rule

use regex::Regex;

use crate::config::RuleSpec;
use crate::naming::{DecomposedName, FieldSet, Template, fields};
use crate::{Error, Result};

/// A rename rule ready for matching
#[derive(Debug, Clone)]
pub struct RenameRule {
    /// Key under `nsc.rename`; also the import entry identifier
    pub name: String,
    /// Only names with this mode are considered
    pub mode: Option<String>,
    /// Searched within the decomposed base name; named groups become fields
    pub pattern: Option<Regex>,
    /// Local name template
    pub template: Template,
    /// Whether a match may trigger an import
    pub importable: bool,
}

impl RenameRule {
    /// Compile a rule from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the pattern does not compile, the
    /// template is malformed, or the template references a field that
    /// neither decomposition nor the pattern can provide.
    pub fn compile(name: &str, spec: &RuleSpec) -> Result<Self> {
        let pattern = spec
            .pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| Error::config(format!("rule '{}': invalid pattern: {}", name, e)))?;

        let template = Template::parse(&spec.replace)
            .map_err(|e| Error::config(format!("rule '{}': {}", name, e)))?;

        let rule = Self {
            name: name.to_string(),
            mode: spec.mode.clone(),
            pattern,
            template,
            importable: spec.importable,
        };

        if let Some(field) = rule.unknown_reference() {
            return Err(Error::config(format!(
                "rule '{}': template references unknown field '{{{}}}'",
                name, field
            )));
        }

        Ok(rule)
    }

    /// The merged field set if this rule accepts `decomposed`.
    ///
    /// Pattern groups override decomposed fields of the same name. A group
    /// that did not take part in the match contributes an empty string.
    pub fn accept(&self, decomposed: &DecomposedName) -> Option<FieldSet> {
        if let Some(mode) = &self.mode
            && mode != &decomposed.mode
        {
            return None;
        }

        let mut merged = decomposed.fields();

        if let Some(pattern) = &self.pattern {
            let caps = pattern.captures(&decomposed.base_name)?;
            for group in pattern.capture_names().flatten() {
                let value = caps.name(group).map(|m| m.as_str()).unwrap_or_default();
                merged.insert(group.to_string(), value.to_string());
            }
        }

        Some(merged)
    }

    /// Render the local name from an accepted field set.
    pub fn render(&self, fields: &FieldSet) -> Result<String> {
        self.template.render(fields).map_err(|e| match e {
            crate::naming::TemplateError::Unresolved { field } => Error::RuleTemplate {
                rule: self.name.clone(),
                field,
            },
            other => Error::config(format!("rule '{}': {}", self.name, other)),
        })
    }

    fn unknown_reference(&self) -> Option<&str> {
        let groups: Vec<&str> = self
            .pattern
            .as_ref()
            .map(|p| p.capture_names().flatten().collect())
            .unwrap_or_default();

        self.template
            .fields()
            .find(|f| !fields::ALL.contains(f) && !groups.contains(f))
    }
}
