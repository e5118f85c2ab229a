//! `{field}` templates for local names and import arguments

use super::FieldSet;

/// Errors raised while parsing or rendering a template
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("invalid template '{template}': {message}")]
    Syntax { template: String, message: String },

    #[error("unresolved field '{field}'")]
    Unresolved { field: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A parsed template such as `{term}_{nsctype}_{submitted}.{ext}`.
///
/// `{{` and `}}` render literal braces. Field names are ASCII letters,
/// digits and underscores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template string.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let syntax = |message: &str| TemplateError::Syntax {
            template: source.to_string(),
            message: message.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) if ch.is_ascii_alphanumeric() || ch == '_' => name.push(ch),
                            Some(ch) => {
                                return Err(syntax(&format!("unexpected '{}' in field name", ch)));
                            }
                            None => return Err(syntax("unclosed '{'")),
                        }
                    }
                    if name.is_empty() {
                        return Err(syntax("empty field name"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(name));
                }
                '}' => return Err(syntax("unmatched '}'")),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The original template text
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Field names referenced by the template, in order of appearance
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Whether the template references `field`
    pub fn references(&self, field: &str) -> bool {
        self.fields().any(|f| f == field)
    }

    /// Render with values from `fields`; a missing field is an error,
    /// never an empty substitution.
    pub fn render(&self, fields: &FieldSet) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => {
                    let value = fields.get(name).ok_or_else(|| TemplateError::Unresolved {
                        field: name.clone(),
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}
