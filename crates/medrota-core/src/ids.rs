//! Composite identifiers used as join keys across the system.
//!
//! The wire keeps the string forms (`<classId>::<subshiftId>` for runtime
//! row ids, `<rowId>__<dateISO>` for per-day slot buckets); internally the
//! parts are kept structured.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Separator between class id and subshift id in a runtime row id.
pub const ROW_ID_SEPARATOR: &str = "::";

/// Separator between row id and date in a slot bucket key.
pub const SLOT_KEY_SEPARATOR: &str = "__";

/// Subshift id assumed for legacy row ids written without a separator.
pub const DEFAULT_SUBSHIFT_ID: &str = "s1";

/// Runtime row id: a `(class, subshift)` pair.
///
/// Serialized as `<classId>::<subshiftId>`. Parsing splits on the first
/// `::`; a bare class id is the legacy single-subshift form and resolves
/// to subshift `s1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId {
    class_id: String,
    subshift_id: String,
}

impl RowId {
    pub fn new(class_id: impl Into<String>, subshift_id: impl Into<String>) -> Self {
        Self {
            class_id: class_id.into(),
            subshift_id: subshift_id.into(),
        }
    }

    /// Splits a raw row id into class id and optional subshift id without
    /// applying the legacy default.
    pub fn split(raw: &str) -> (&str, Option<&str>) {
        match raw.split_once(ROW_ID_SEPARATOR) {
            Some((class, sub)) if !sub.is_empty() => (class, Some(sub)),
            Some((class, _)) => (class, None),
            None => (raw, None),
        }
    }

    /// Parses a raw row id, resolving the legacy form to `s1`.
    pub fn parse(raw: &str) -> Self {
        let (class, sub) = Self::split(raw);
        Self::new(class, sub.unwrap_or(DEFAULT_SUBSHIFT_ID))
    }

    /// True when the raw form carries no subshift part.
    pub fn is_legacy(raw: &str) -> bool {
        Self::split(raw).1.is_none()
    }

    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn subshift_id(&self) -> &str {
        &self.subshift_id
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.class_id, ROW_ID_SEPARATOR, self.subshift_id)
    }
}

impl FromStr for RowId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for RowId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RowId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Bucket key identifying all instances of a row on one date.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    pub row: RowId,
    pub date: NaiveDate,
}

impl SlotKey {
    pub fn new(row: RowId, date: NaiveDate) -> Self {
        Self { row, date }
    }

    /// Parses `<rowId>__<dateISO>`, splitting on the first `__`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (row, date) = raw.split_once(SLOT_KEY_SEPARATOR)?;
        if row.is_empty() {
            return None;
        }
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        Some(Self::new(RowId::parse(row), date))
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.row,
            SLOT_KEY_SEPARATOR,
            self.date.format("%Y-%m-%d")
        )
    }
}
