//! Fixed-grammar filename decomposition

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Serialize;

use super::{FieldSet, fields};

static NAME_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<school>[^_]+)_(?P<seq>[^_]+)_(?P<type>[^_]+)_(?P<mode>[^_]+)_(?P<stamp>\d{14})_(?P<base>.+)\.(?P<ext>[^.]+)$",
    )
    .unwrap()
});

/// Structured fields of a remote filename
///
/// A name outside the grammar decomposes to an unstructured value whose
/// `base_name` is the whole raw name and whose other fields are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecomposedName {
    pub raw: String,
    pub school_code: String,
    pub sequence_id: String,
    pub report_type: String,
    pub mode: String,
    pub submitted_at: Option<NaiveDateTime>,
    pub base_name: String,
    pub extension: String,
}

impl DecomposedName {
    fn unstructured(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            school_code: String::new(),
            sequence_id: String::new(),
            report_type: String::new(),
            mode: String::new(),
            submitted_at: None,
            base_name: raw.to_string(),
            extension: String::new(),
        }
    }

    /// Whether the name matched the grammar.
    ///
    /// Unstructured names never match a rule and keep their remote name.
    pub fn is_structured(&self) -> bool {
        !self.report_type.is_empty() && !self.mode.is_empty()
    }

    /// The decomposed values keyed by template field name
    pub fn fields(&self) -> FieldSet {
        let mut set = FieldSet::new();
        set.insert(fields::FILENAME.into(), self.raw.clone());
        set.insert(fields::SCHOOL_CODE.into(), self.school_code.clone());
        set.insert(fields::SEQUENCE_ID.into(), self.sequence_id.clone());
        set.insert(fields::TYPE.into(), self.report_type.clone());
        set.insert(fields::MODE.into(), self.mode.clone());
        let (stamp, date, time) = match self.submitted_at {
            Some(at) => (
                at.format("%Y%m%d%H%M%S").to_string(),
                at.format("%Y%m%d").to_string(),
                at.format("%H%M%S").to_string(),
            ),
            None => Default::default(),
        };
        set.insert(fields::SUB_DATETIME.into(), stamp);
        set.insert(fields::SUB_DATE.into(), date);
        set.insert(fields::SUB_TIME.into(), time);
        set.insert(fields::BASE_NAME.into(), self.base_name.clone());
        set.insert(fields::EXTENSION.into(), self.extension.clone());
        set
    }
}

/// Split a raw remote filename into its grammar fields.
///
/// Never fails: a name that does not match the grammar, or whose embedded
/// timestamp is not a real `MMDDYYYYHHMMSS` moment, comes back unstructured.
pub fn decompose(raw: &str) -> DecomposedName {
    let Some(caps) = NAME_GRAMMAR.captures(raw) else {
        return DecomposedName::unstructured(raw);
    };

    let Some(submitted_at) = parse_stamp(&caps["stamp"]) else {
        tracing::debug!(name = raw, "embedded timestamp is not a valid date");
        return DecomposedName::unstructured(raw);
    };

    DecomposedName {
        raw: raw.to_string(),
        school_code: caps["school"].to_string(),
        sequence_id: caps["seq"].to_string(),
        report_type: caps["type"].to_string(),
        mode: caps["mode"].to_string(),
        submitted_at: Some(submitted_at),
        base_name: caps["base"].to_string(),
        extension: caps["ext"].to_string(),
    }
}

/// Parse `MMDDYYYYHHMMSS`; the grammar already guarantees 14 ASCII digits.
fn parse_stamp(stamp: &str) -> Option<NaiveDateTime> {
    let part = |range: std::ops::Range<usize>| stamp.get(range)?.parse::<u32>().ok();

    let month = part(0..2)?;
    let day = part(2..4)?;
    let year = part(4..8)? as i32;
    let hour = part(8..10)?;
    let minute = part(10..12)?;
    let second = part(12..14)?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}
