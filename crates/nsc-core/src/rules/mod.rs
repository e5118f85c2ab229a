//! Ordered rename rules and first-match resolution
//!
//! Rules are evaluated in declaration order and the first rule whose
//! filters accept a name wins. Operators control precedence purely by
//! the order of entries under `nsc.rename`.

mod catalog;
mod matcher;
mod rule;

pub use catalog::RuleCatalog;
pub use matcher::Resolution;
pub use rule::RenameRule;
