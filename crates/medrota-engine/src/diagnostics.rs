//! Run diagnostics: notes and structured debug info.

use chrono::NaiveDate;
use serde::Serialize;

use medrota_core::eligibility::EligibilityMatrix;
use medrota_core::state::StateSnapshot;
use medrota_core::SlotInstance;
use medrota_cp::SolveStatus;

use crate::extract::ChosenSlot;

/// A required slot instance that stayed (partially) unfilled.
#[derive(Debug, Clone, Serialize)]
pub struct UncoveredSlot {
    #[serde(rename = "dateISO")]
    pub date: NaiveDate,
    #[serde(rename = "rowId")]
    pub row_id: String,
    pub missing: u32,
}

/// A clinician outside their working-hours tolerance band.
#[derive(Debug, Clone, Serialize)]
pub struct HoursViolation {
    #[serde(rename = "clinicianId")]
    pub clinician_id: String,
    #[serde(rename = "assignedMinutes")]
    pub assigned_minutes: i64,
    #[serde(rename = "targetMinutes")]
    pub target_minutes: i64,
    #[serde(rename = "deviationMinutes")]
    pub deviation_minutes: i64,
}

/// A manual pin that conflicts with the hard constraints.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedPin {
    #[serde(rename = "assignmentId")]
    pub assignment_id: String,
    pub reason: medrota_core::PinConflictKind,
}

/// Structured diagnostics of one solve run.
#[derive(Debug, Clone, Serialize)]
pub struct DebugInfo {
    pub solver_status: SolveStatus,
    pub time_ms: u64,
    pub solution_count: u64,
    pub uncovered: Vec<UncoveredSlot>,
    pub hours_violations: Vec<HoursViolation>,
    pub rejected_pins: Vec<RejectedPin>,
}

/// Per-shard coverage accounting against the final chosen slots.
///
/// Returns uncovered entries plus notes for slots nobody can fill.
pub fn shard_coverage(
    instances: &[SlotInstance],
    matrix: &EligibilityMatrix,
    chosen: &[ChosenSlot],
) -> (Vec<UncoveredSlot>, Vec<String>) {
    let eligible_counts = matrix.eligible_counts(instances.len());

    let mut remaining: Vec<i64> = vec![0; instances.len()];
    for (idx, instance) in instances.iter().enumerate() {
        remaining[idx] = i64::from(instance.required)
            - i64::from(matrix.pinned_by_instance[idx]);
    }

    // chosen slots address their instance by (row, date) bucket position
    let mut buckets: std::collections::BTreeMap<
        (medrota_core::RowId, NaiveDate),
        Vec<usize>,
    > = std::collections::BTreeMap::new();
    for (idx, instance) in instances.iter().enumerate() {
        buckets
            .entry((instance.row.clone(), instance.date))
            .or_default()
            .push(idx);
    }
    for bucket in buckets.values_mut() {
        bucket.sort_by_key(|&idx| (instances[idx].local.start, instances[idx].local.end));
    }
    for slot in chosen {
        if let Some(bucket) = buckets.get(&(slot.row.clone(), slot.date)) {
            if let Some(&idx) = bucket.get(slot.seq as usize) {
                remaining[idx] -= 1;
            }
        }
    }

    let mut uncovered = Vec::new();
    let mut notes = Vec::new();
    for (idx, instance) in instances.iter().enumerate() {
        let missing = remaining[idx].max(0) as u32;
        if missing == 0 || instance.required == 0 {
            continue;
        }
        uncovered.push(UncoveredSlot {
            date: instance.date,
            row_id: instance.row.to_string(),
            missing,
        });
        if eligible_counts[idx] == 0 && matrix.pinned_by_instance[idx] == 0 {
            notes.push(format!(
                "No eligible clinician for {} on {} ({} required).",
                instance.row, instance.date, instance.required
            ));
        }
    }
    (uncovered, notes)
}

/// Working-hours accounting over the full requested range.
pub fn hours_violations(
    state: &StateSnapshot,
    chosen: &[ChosenSlot],
    pinned_minutes: &[(usize, i64)],
    working_days: u32,
) -> Vec<HoursViolation> {
    let default_tolerance = state.solver_settings.working_hours_tolerance_hours;
    let mut assigned = vec![0i64; state.clinicians.len()];
    for slot in chosen {
        assigned[slot.clinician] += slot.local.duration_minutes();
    }
    for &(clinician, minutes) in pinned_minutes {
        assigned[clinician] += minutes;
    }

    let mut violations = Vec::new();
    for (idx, clinician) in state.clinicians.iter().enumerate() {
        let Some(hours_per_week) = clinician.working_hours_per_week else {
            continue;
        };
        let target = (hours_per_week * 60.0 * f64::from(working_days) / 5.0).round() as i64;
        let tolerance_hours = clinician
            .working_hours_tolerance_hours
            .unwrap_or(default_tolerance);
        let tolerance = (tolerance_hours * 60.0).round() as i64;
        let deviation = (assigned[idx] - target).abs() - tolerance;
        if deviation > 0 {
            violations.push(HoursViolation {
                clinician_id: clinician.id.clone(),
                assigned_minutes: assigned[idx],
                target_minutes: target,
                deviation_minutes: deviation,
            });
        }
    }
    violations
}

/// True when a manual on-call entry inside the range has its rest window
/// colliding with manual entries on boundary days outside the range.
pub fn has_rest_boundary_conflict(
    state: &StateSnapshot,
    matrix: &EligibilityMatrix,
    start: NaiveDate,
    end: NaiveDate,
) -> bool {
    let settings = &state.solver_settings;
    if !settings.on_call_rest_enabled {
        return false;
    }
    let before = settings.on_call_rest_days_before;
    let after = settings.on_call_rest_days_after;

    for shift in &matrix.manual {
        if !shift.is_on_call || shift.date < start || shift.date > end {
            continue;
        }
        let mut boundary_days: Vec<NaiveDate> = Vec::new();
        for offset in 1..=before {
            boundary_days.push(shift.date - chrono::Duration::days(offset));
        }
        for offset in 1..=after {
            boundary_days.push(shift.date + chrono::Duration::days(offset));
        }
        for day in boundary_days {
            if day >= start && day <= end {
                continue;
            }
            let collides = matrix.manual.iter().any(|other| {
                other.clinician == shift.clinician && other.date == day && other.row.is_some()
            });
            if collides {
                return true;
            }
        }
    }
    false
}

/// The note the original scheduler emits for boundary rest collisions.
pub const REST_BOUNDARY_NOTE: &str =
    "Rest day conflicts outside the selected range; some boundary days are already assigned.";

/// The note for incomplete required coverage.
pub const UNFILLED_NOTE: &str = "Could not fill all required slots.";
