//! Solver settings and declarative solver rules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_rest_days() -> i64 {
    1
}

fn default_tolerance_hours() -> f64 {
    5.0
}

/// User-tunable scheduling behavior stored with the state.
///
/// Unknown keys are collected so normalization can flag deprecated
/// settings (`allowMultipleShiftsPerDay`, `showDistributionPool`,
/// `showReservePool`) before discarding them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    #[serde(rename = "enforceSameLocationPerDay", default)]
    pub enforce_same_location_per_day: bool,
    /// When on, a clinician's shifts per day and location must form one
    /// contiguous block.
    #[serde(rename = "preferContinuousShifts", default = "default_true")]
    pub prefer_continuous_shifts: bool,
    #[serde(rename = "onCallRestEnabled", default)]
    pub on_call_rest_enabled: bool,
    #[serde(rename = "onCallRestClassId", default)]
    pub on_call_rest_class_id: Option<String>,
    #[serde(rename = "onCallRestDaysBefore", default = "default_rest_days")]
    pub on_call_rest_days_before: i64,
    #[serde(rename = "onCallRestDaysAfter", default = "default_rest_days")]
    pub on_call_rest_days_after: i64,
    /// Hard rest blocking by default; the soft form only penalizes.
    #[serde(rename = "onCallRestHard", default = "default_true")]
    pub on_call_rest_hard: bool,
    #[serde(rename = "workingHoursToleranceHours", default = "default_tolerance_hours")]
    pub working_hours_tolerance_hours: f64,
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            enforce_same_location_per_day: false,
            prefer_continuous_shifts: true,
            on_call_rest_enabled: false,
            on_call_rest_class_id: None,
            on_call_rest_days_before: 1,
            on_call_rest_days_after: 1,
            on_call_rest_hard: true,
            working_hours_tolerance_hours: 5.0,
            unknown: BTreeMap::new(),
        }
    }
}

/// What a solver rule schedules on the adjacent day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThenType {
    ShiftRow,
    Off,
}

/// Declarative follow-up rule: "if this shift row, then that one (or a
/// day off) the day before/after". Rules referring to unknown shift rows
/// are kept but disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverRule {
    pub id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(rename = "ifShiftRowId")]
    pub if_shift_row_id: String,
    #[serde(rename = "dayDelta")]
    pub day_delta: i8,
    #[serde(rename = "thenType")]
    pub then_type: ThenType,
    #[serde(rename = "thenShiftRowId", default)]
    pub then_shift_row_id: Option<String>,
}
