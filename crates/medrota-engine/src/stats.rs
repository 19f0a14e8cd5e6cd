//! Live schedule statistics.
//!
//! A pure function of the current assignment set and the snapshot; no
//! incremental state crosses calls, so it can run on every incumbent and
//! post hoc alike.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use medrota_core::domain::Assignment;
use medrota_core::ids::RowId;
use medrota_core::state::StateSnapshot;
use medrota_core::time::MinuteSpan;
use medrota_core::CalendarProjector;

/// Aggregate numbers over one schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleStats {
    #[serde(rename = "filledSlots")]
    pub filled_slots: u32,
    #[serde(rename = "totalRequiredSlots")]
    pub total_required_slots: u32,
    #[serde(rename = "openSlots")]
    pub open_slots: u32,
    /// Clinician-days whose assigned intervals are not one contiguous run.
    #[serde(rename = "nonConsecutiveShifts")]
    pub non_consecutive_shifts: u32,
    #[serde(rename = "cliniciansWithinHours")]
    pub clinicians_within_hours: u32,
    #[serde(rename = "totalCliniciansWithTarget")]
    pub total_clinicians_with_target: u32,
}

/// Trailing sequence number of a canonical assignment id.
fn seq_hint(id: &str) -> Option<usize> {
    id.rsplit_once('-').and_then(|(_, tail)| tail.parse().ok())
}

/// Evaluates schedule statistics for an assignment set over a range.
///
/// Assignments are matched back to slot instances bucket-wise in start
/// order; overfilled buckets clamp to the required count.
pub fn evaluate(
    state: &StateSnapshot,
    assignments: &[Assignment],
    start: NaiveDate,
    end: NaiveDate,
) -> ScheduleStats {
    let projector = CalendarProjector::new(state, start, end);
    let instances = projector.instances();

    // (row, date) -> instance indices in start order
    let mut buckets: BTreeMap<(RowId, NaiveDate), Vec<usize>> = BTreeMap::new();
    for (idx, instance) in instances.iter().enumerate() {
        buckets
            .entry((instance.row.clone(), instance.date))
            .or_default()
            .push(idx);
    }
    for bucket in buckets.values_mut() {
        bucket.sort_by_key(|&idx| instances[idx].local.start);
    }

    let mut assigned_count = vec![0u32; instances.len()];
    let mut consumed: BTreeMap<(RowId, NaiveDate), usize> = BTreeMap::new();
    let mut spans_by_clinician_day: BTreeMap<(usize, NaiveDate), Vec<MinuteSpan>> = BTreeMap::new();
    let mut minutes_by_clinician = vec![0i64; state.clinicians.len()];

    for assignment in assignments {
        if assignment.date < start || assignment.date > end {
            continue;
        }
        if assignment.row_id.starts_with("pool-") {
            continue;
        }
        let Some(clinician) = state.clinician_index(&assignment.clinician_id) else {
            continue;
        };
        let row = RowId::parse(&assignment.row_id);
        let key = (row, assignment.date);
        let Some(bucket) = buckets.get(&key) else {
            continue;
        };
        // canonical ids carry the instance's bucket position as their
        // trailing sequence number (several records may share a position
        // on multi-head instances); records without a usable hint walk
        // the bucket in start order
        let position = match seq_hint(&assignment.id).filter(|&s| s < bucket.len()) {
            Some(hinted) => hinted,
            None => {
                let cursor = consumed.entry(key).or_insert(0);
                let position = *cursor;
                *cursor += 1;
                if position >= bucket.len() {
                    continue;
                }
                position
            }
        };
        let instance_idx = bucket[position];

        assigned_count[instance_idx] += 1;
        let local = instances[instance_idx].local;
        minutes_by_clinician[clinician] += local.duration_minutes();
        spans_by_clinician_day
            .entry((clinician, assignment.date))
            .or_default()
            .push(local);
    }

    let mut filled = 0u32;
    let mut total_required = 0u32;
    for (idx, instance) in instances.iter().enumerate() {
        total_required += instance.required;
        filled += assigned_count[idx].min(instance.required);
    }

    let mut non_consecutive = 0u32;
    for spans in spans_by_clinician_day.values_mut() {
        if spans.len() < 2 {
            continue;
        }
        spans.sort_by_key(|s| (s.start, s.end));
        let split = spans.windows(2).any(|w| w[0].end < w[1].start);
        if split {
            non_consecutive += 1;
        }
    }

    let default_tolerance = state.solver_settings.working_hours_tolerance_hours;
    let working_days = projector.working_days();
    let mut with_target = 0u32;
    let mut within = 0u32;
    for (idx, clinician) in state.clinicians.iter().enumerate() {
        let Some(hours_per_week) = clinician.working_hours_per_week else {
            continue;
        };
        with_target += 1;
        let target = (hours_per_week * 60.0 * f64::from(working_days) / 5.0).round() as i64;
        let tolerance_hours = clinician
            .working_hours_tolerance_hours
            .unwrap_or(default_tolerance);
        let tolerance = (tolerance_hours * 60.0).round() as i64;
        if (minutes_by_clinician[idx] - target).abs() <= tolerance {
            within += 1;
        }
    }

    ScheduleStats {
        filled_slots: filled,
        total_required_slots: total_required,
        open_slots: total_required - filled,
        non_consecutive_shifts: non_consecutive,
        clinicians_within_hours: within,
        total_clinicians_with_target: with_target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medrota_core::domain::DayType;
    use medrota_core::state::normalize;
    use medrota_core::test_utils::{add_slot, state_with_single_slot};

    fn date(iso: &str) -> NaiveDate {
        iso.parse().unwrap()
    }

    fn assignment(row: &str, iso: &str, clinician: &str) -> Assignment {
        Assignment {
            id: format!("a-{row}-{iso}-{clinician}-0"),
            row_id: row.to_string(),
            date: date(iso),
            clinician_id: clinician.to_string(),
            manual: false,
        }
    }

    #[test]
    fn counts_filled_and_open_slots() {
        let mut raw = state_with_single_slot("section-a", 2, "08:00", "16:00");
        add_slot(&mut raw, "slot-b__mon", "section-a", DayType::Mon, 1, "16:00", "20:00");
        let (state, _) = normalize(raw);

        let assignments = vec![assignment("section-a::s1", "2026-01-05", "clin-1")];
        let stats = evaluate(&state, &assignments, date("2026-01-05"), date("2026-01-05"));

        assert_eq!(stats.total_required_slots, 3);
        assert_eq!(stats.filled_slots, 1);
        assert_eq!(stats.open_slots, 2);
        assert_eq!(stats.non_consecutive_shifts, 0);
    }

    #[test]
    fn overfill_clamps_to_required() {
        let mut raw = state_with_single_slot("section-a", 1, "08:00", "16:00");
        raw.clinicians.push(medrota_core::test_utils::make_clinician("clin-2", &["section-a"]));
        let (state, _) = normalize(raw);

        let assignments = vec![
            assignment("section-a::s1", "2026-01-05", "clin-1"),
            assignment("section-a::s1", "2026-01-05", "clin-2"),
        ];
        let stats = evaluate(&state, &assignments, date("2026-01-05"), date("2026-01-05"));
        assert_eq!(stats.filled_slots, 1);
        assert_eq!(stats.open_slots, 0);
    }

    #[test]
    fn detects_non_consecutive_days() {
        let mut raw = state_with_single_slot("section-a", 1, "08:00", "12:00");
        add_slot(&mut raw, "slot-b__mon", "section-a", DayType::Mon, 1, "13:00", "16:00");
        let (state, _) = normalize(raw);

        // two assignments to the same bucket: 08-12 and 13-16 with a gap
        let assignments = vec![
            assignment("section-a::s1", "2026-01-05", "clin-1"),
            Assignment {
                id: "a-section-a::s1-2026-01-05-clin-1-1".to_string(),
                ..assignment("section-a::s1", "2026-01-05", "clin-1")
            },
        ];
        let stats = evaluate(&state, &assignments, date("2026-01-05"), date("2026-01-05"));
        assert_eq!(stats.non_consecutive_shifts, 1);
    }

    #[test]
    fn hours_targets_scale_with_working_days() {
        let mut raw = state_with_single_slot("section-a", 1, "08:00", "16:00");
        raw.clinicians[0].working_hours_per_week = Some(40.0);
        let (state, _) = normalize(raw);

        // single Monday: scale 1/5 -> 8h target, 8h assigned
        let assignments = vec![assignment("section-a::s1", "2026-01-05", "clin-1")];
        let stats = evaluate(&state, &assignments, date("2026-01-05"), date("2026-01-05"));
        assert_eq!(stats.total_clinicians_with_target, 1);
        assert_eq!(stats.clinicians_within_hours, 1);

        // idle clinician over the same day misses the target
        let stats = evaluate(&state, &[], date("2026-01-05"), date("2026-01-05"));
        assert_eq!(stats.clinicians_within_hours, 0);
    }
}
