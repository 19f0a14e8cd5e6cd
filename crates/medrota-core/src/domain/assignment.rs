//! Assignment records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One clinician working one row bucket on one date.
///
/// `row_id` keeps its wire string form because pool assignments
/// (`pool-rest-day`, …) are not runtime row ids. Manual records are
/// immutable inputs; solver records are replaced on re-solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    #[serde(rename = "rowId")]
    pub row_id: String,
    #[serde(rename = "dateISO")]
    pub date: NaiveDate,
    #[serde(rename = "clinicianId")]
    pub clinician_id: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub manual: bool,
}

impl Assignment {
    pub fn manual(
        id: impl Into<String>,
        row_id: impl Into<String>,
        date: NaiveDate,
        clinician_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            row_id: row_id.into(),
            date,
            clinician_id: clinician_id.into(),
            manual: true,
        }
    }
}
