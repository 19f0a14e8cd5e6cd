//! Locations, workplace rows and their sub-shifts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A physical site shifts can take place at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
}

/// Whether a row is a schedulable section or a virtual pool.
///
/// Pools exist for rendering; the optimizer never creates assignments
/// with pool ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Class,
    Pool,
}

/// One of up to three shifts a section runs per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubShift {
    pub id: String,
    pub name: String,
    /// Ordinal 1..=3 within the section.
    pub order: u8,
    #[serde(rename = "startTime", default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(rename = "endTime", default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(rename = "endDayOffset", default, skip_serializing_if = "Option::is_none")]
    pub end_day_offset: Option<i32>,
    /// Legacy nominal hours; normalization converts this into an end time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
}

/// A row of the schedule: either a section ("class") or a pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkplaceRow {
    pub id: String,
    pub name: String,
    pub kind: RowKind,
    #[serde(rename = "dotColorClass", default)]
    pub dot_color_class: String,
    #[serde(rename = "blockColor", default, skip_serializing_if = "Option::is_none")]
    pub block_color: Option<String>,
    #[serde(rename = "locationId", default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(rename = "subShifts", default)]
    pub sub_shifts: Vec<SubShift>,
}

impl WorkplaceRow {
    pub fn is_class(&self) -> bool {
        self.kind == RowKind::Class
    }

    pub fn sub_shift(&self, subshift_id: &str) -> Option<&SubShift> {
        self.sub_shifts.iter().find(|s| s.id == subshift_id)
    }
}

/// Required head-count per row bucket, split by day category.
///
/// Retained for UI compatibility; the weekly template drives the
/// optimizer's required counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MinSlots {
    pub weekday: u32,
    pub weekend: u32,
}

/// A public holiday; its date shadows the weekday when projecting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    #[serde(rename = "dateISO")]
    pub date: NaiveDate,
    pub name: String,
}
