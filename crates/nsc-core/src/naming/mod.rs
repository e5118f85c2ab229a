//! Filename decomposition and template rendering
//!
//! Remote filenames follow a fixed grammar:
//!
//! ```text
//! <schoolCode>_<sequenceId>_<TYPE>_<MODE>_<MMDDYYYYHHMMSS>_<baseName>.<ext>
//! ```
//!
//! [`decompose`] splits a name into a [`DecomposedName`], and
//! [`Template`] renders canonical local names from a [`FieldSet`].

mod decompose;
mod template;

pub use decompose::{DecomposedName, decompose};
pub use template::{Template, TemplateError};

use std::collections::BTreeMap;

/// Named values available to rename and import templates
pub type FieldSet = BTreeMap<String, String>;

/// Field names produced by decomposition
pub mod fields {
    pub const FILENAME: &str = "filename";
    pub const SCHOOL_CODE: &str = "schoolcode";
    pub const SEQUENCE_ID: &str = "seqid";
    pub const TYPE: &str = "nsctype";
    pub const MODE: &str = "nscmode";
    pub const SUB_DATETIME: &str = "subdatetime";
    pub const SUB_DATE: &str = "subdate";
    pub const SUB_TIME: &str = "subtime";
    pub const BASE_NAME: &str = "basename";
    pub const EXTENSION: &str = "ext";

    /// Every field a structured name provides
    pub const ALL: &[&str] = &[
        FILENAME,
        SCHOOL_CODE,
        SEQUENCE_ID,
        TYPE,
        MODE,
        SUB_DATETIME,
        SUB_DATE,
        SUB_TIME,
        BASE_NAME,
        EXTENSION,
    ];
}
