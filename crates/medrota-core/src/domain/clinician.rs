//! Clinicians: qualifications, preferences, absences and working hours.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::DayType;
use crate::error::Result;
use crate::time::{parse_hhmm, MinuteSpan};

/// A closed date range a clinician is away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationRange {
    pub id: String,
    #[serde(rename = "startISO")]
    pub start: NaiveDate,
    #[serde(rename = "endISO")]
    pub end: NaiveDate,
}

impl VacationRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Whether a time window gates eligibility or only scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    /// Slots outside the window are not eligible.
    Mandatory,
    /// Minutes outside the window are penalized in the objective.
    Preferred,
}

/// A per-day-type time window a clinician wants (or must) work within.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(rename = "dayType")]
    pub day_type: DayType,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
    pub kind: WindowKind,
}

impl TimeWindow {
    /// The window as a local minute span.
    pub fn span(&self) -> Result<MinuteSpan> {
        let start = parse_hhmm(&self.start_time)?;
        let end = parse_hhmm(&self.end_time)?;
        Ok(MinuteSpan::from_local(start, end, 0))
    }
}

/// A clinician who can be assigned to shifts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clinician {
    pub id: String,
    pub name: String,
    /// Sections this clinician may be scheduled into (order-insensitive).
    #[serde(rename = "qualifiedClassIds")]
    pub qualified_class_ids: Vec<String>,
    /// Preferred sections, most preferred first; always a subset of the
    /// qualified sections after normalization.
    #[serde(rename = "preferredClassIds", default)]
    pub preferred_class_ids: Vec<String>,
    #[serde(default)]
    pub vacations: Vec<VacationRange>,
    #[serde(
        rename = "workingHoursPerWeek",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub working_hours_per_week: Option<f64>,
    /// Allowed deviation from the weekly target before the hours penalty
    /// applies; falls back to the solver-settings value.
    #[serde(
        rename = "workingHoursToleranceHours",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub working_hours_tolerance_hours: Option<f64>,
    #[serde(rename = "timeWindows", default)]
    pub time_windows: Vec<TimeWindow>,
}

impl Clinician {
    pub fn is_qualified_for(&self, class_id: &str) -> bool {
        self.qualified_class_ids.iter().any(|c| c == class_id)
    }

    /// Rank of a section in the preference list (0 = most preferred).
    pub fn preference_rank(&self, class_id: &str) -> Option<usize> {
        self.preferred_class_ids.iter().position(|c| c == class_id)
    }

    pub fn is_on_vacation(&self, date: NaiveDate) -> bool {
        self.vacations.iter().any(|v| v.contains(date))
    }

    pub fn windows_for(&self, day_type: DayType) -> impl Iterator<Item = &TimeWindow> {
        self.time_windows.iter().filter(move |w| w.day_type == day_type)
    }
}
