//! Eligibility resolution: which clinician may staff which slot instance.
//!
//! Produces the feasibility matrix the model builder turns into decision
//! variables, the resolved manual pins (constants from the model's point
//! of view) and any pin conflicts that make a shard infeasible.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::debug;

use crate::calendar::{CalendarProjector, SlotInstance};
use crate::domain::{Clinician, WindowKind, POOL_REST_DAY, POOL_VACATION};
use crate::ids::RowId;
use crate::state::StateSnapshot;
use crate::time::{parse_hhmm, MinuteSpan};

/// A manual assignment resolved against the calendar.
#[derive(Debug, Clone)]
pub struct ManualShift {
    /// Index into the snapshot's assignment list.
    pub assignment_index: usize,
    pub clinician: usize,
    pub date: NaiveDate,
    /// `None` for pool assignments.
    pub row: Option<RowId>,
    /// Matched slot instance when the date lies inside the range.
    pub instance: Option<usize>,
    /// Absolute span when shift times are known.
    pub span: Option<MinuteSpan>,
    pub location_id: Option<String>,
    pub is_on_call: bool,
    /// A `pool-rest-day` entry blocks the clinician's whole day.
    pub blocks_whole_day: bool,
}

/// Why a pin cannot be honored without breaking a hard constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PinConflictKind {
    UnqualifiedClinician,
    OnVacation,
    OverlappingPins,
}

/// A manual pin violating the hard constraints of the current snapshot.
///
/// Pins are immutable inputs; the shard containing a conflicting pin is
/// reported infeasible and skipped, other shards continue.
#[derive(Debug, Clone, Serialize)]
pub struct PinConflict {
    #[serde(rename = "assignmentId")]
    pub assignment_id: String,
    #[serde(rename = "clinicianId")]
    pub clinician_id: String,
    #[serde(rename = "dateISO")]
    pub date: NaiveDate,
    pub kind: PinConflictKind,
}

/// One feasible (clinician, slot instance) pairing with its precomputed
/// soft-term inputs.
#[derive(Debug, Clone)]
pub struct EligiblePair {
    pub clinician: usize,
    pub instance: usize,
    /// Rank in the clinician's preference list, 0 = most preferred.
    pub preference_rank: Option<usize>,
    /// Minutes of the slot outside the clinician's preferred windows.
    pub window_miss_minutes: i64,
}

/// The resolver's full output for one shard.
#[derive(Debug)]
pub struct EligibilityMatrix {
    pub pairs: Vec<EligiblePair>,
    pub manual: Vec<ManualShift>,
    pub pin_conflicts: Vec<PinConflict>,
    /// Manual pins matched per instance, for capacity accounting.
    pub pinned_by_instance: Vec<u32>,
}

impl EligibilityMatrix {
    /// Number of eligible clinicians per instance.
    pub fn eligible_counts(&self, instance_count: usize) -> Vec<u32> {
        let mut counts = vec![0u32; instance_count];
        for pair in &self.pairs {
            counts[pair.instance] += 1;
        }
        counts
    }
}

/// Resolves eligibility for every (clinician, instance) pair of a shard.
pub fn resolve(
    state: &StateSnapshot,
    projector: &CalendarProjector<'_>,
    instances: &[SlotInstance],
) -> EligibilityMatrix {
    let settings = &state.solver_settings;
    let rest_enabled = settings.on_call_rest_enabled;
    let rest_before = if rest_enabled { settings.on_call_rest_days_before } else { 0 };
    let rest_after = if rest_enabled { settings.on_call_rest_days_after } else { 0 };
    // In the soft rest form nearby slots stay eligible and the objective
    // charges for them instead.
    let rest_blocks = rest_enabled && settings.on_call_rest_hard;
    let on_call_class = settings.on_call_rest_class_id.as_deref();

    let manual = resolve_manual(state, projector, instances, rest_before, rest_after);
    let pin_conflicts = find_pin_conflicts(state, &manual);

    let mut pinned_by_instance = vec![0u32; instances.len()];
    for shift in &manual {
        if let Some(idx) = shift.instance {
            pinned_by_instance[idx] += 1;
        }
    }

    // Per-clinician manual context for the hard eligibility rules.
    let mut manual_by_clinician: Vec<SmallVec<[usize; 4]>> =
        vec![SmallVec::new(); state.clinicians.len()];
    for (shift_idx, shift) in manual.iter().enumerate() {
        manual_by_clinician[shift.clinician].push(shift_idx);
    }

    let mut pairs = Vec::new();
    for (instance_idx, instance) in instances.iter().enumerate() {
        let section_id = instance.row.class_id();
        let is_on_call_section = on_call_class == Some(section_id);

        for (clinician_idx, clinician) in state.clinicians.iter().enumerate() {
            if !clinician.is_qualified_for(section_id) {
                continue;
            }
            if clinician.is_on_vacation(instance.date) {
                continue;
            }

            let mut blocked = false;
            for &shift_idx in &manual_by_clinician[clinician_idx] {
                let shift = &manual[shift_idx];
                if shift.blocks_whole_day && shift.date == instance.date {
                    blocked = true;
                    break;
                }
                if let Some(span) = shift.span {
                    if span.overlaps(instance.span) {
                        blocked = true;
                        break;
                    }
                }
                if rest_blocks && !is_on_call_section && shift.is_on_call && shift.date != instance.date {
                    let delta = instance
                        .date
                        .signed_duration_since(shift.date)
                        .num_days();
                    // rest days after the on-call day, and before it
                    if (delta > 0 && delta <= rest_after) || (delta < 0 && -delta <= rest_before) {
                        blocked = true;
                        break;
                    }
                }
            }
            if blocked {
                continue;
            }

            if !mandatory_window_admits(clinician, instance) {
                continue;
            }

            pairs.push(EligiblePair {
                clinician: clinician_idx,
                instance: instance_idx,
                preference_rank: clinician.preference_rank(section_id),
                window_miss_minutes: preferred_window_miss(clinician, instance),
            });
        }
    }

    debug!(
        pairs = pairs.len(),
        pins = manual.len(),
        conflicts = pin_conflicts.len(),
        "eligibility resolved"
    );

    EligibilityMatrix {
        pairs,
        manual,
        pin_conflicts,
        pinned_by_instance,
    }
}

fn resolve_manual(
    state: &StateSnapshot,
    projector: &CalendarProjector<'_>,
    instances: &[SlotInstance],
    rest_before: i64,
    rest_after: i64,
) -> Vec<ManualShift> {
    let on_call_class = state.solver_settings.on_call_rest_class_id.as_deref();
    // Manual assignments slightly outside the range still matter: an
    // overnight shift overlaps the first day, an on-call entry projects
    // its rest window into the range.
    let context_before = rest_after.max(1);
    let context_after = rest_before.max(1);
    let first = projector.start() - chrono::Duration::days(context_before);
    let last = projector.end() + chrono::Duration::days(context_after);

    // Instances per (row, date) bucket, in start order, so pins on the
    // same bucket consume instances deterministically.
    let mut buckets: BTreeMap<(RowId, NaiveDate), SmallVec<[usize; 2]>> = BTreeMap::new();
    for (idx, instance) in instances.iter().enumerate() {
        buckets
            .entry((instance.row.clone(), instance.date))
            .or_default()
            .push(idx);
    }
    for bucket in buckets.values_mut() {
        bucket.sort_by_key(|&idx| instances[idx].local.start);
    }
    let mut consumed: BTreeMap<(RowId, NaiveDate), usize> = BTreeMap::new();

    let mut manual = Vec::new();
    for (assignment_index, assignment) in state.assignments.iter().enumerate() {
        if !assignment.manual {
            continue;
        }
        if assignment.date < first || assignment.date > last {
            continue;
        }
        let Some(clinician) = state.clinician_index(&assignment.clinician_id) else {
            continue;
        };

        if assignment.row_id.starts_with("pool-") {
            if assignment.row_id == POOL_VACATION {
                // vacation pools are display-only; absences come from the
                // clinician's vacation ranges
                continue;
            }
            manual.push(ManualShift {
                assignment_index,
                clinician,
                date: assignment.date,
                row: None,
                instance: None,
                span: None,
                location_id: None,
                is_on_call: false,
                blocks_whole_day: assignment.row_id == POOL_REST_DAY,
            });
            continue;
        }

        let row = RowId::parse(&assignment.row_id);
        let bucket_key = (row.clone(), assignment.date);
        let instance = buckets.get(&bucket_key).and_then(|bucket| {
            let cursor = consumed.entry(bucket_key.clone()).or_insert(0);
            let picked = bucket.get(*cursor).copied();
            if picked.is_some() {
                *cursor += 1;
            }
            picked
        });

        let (span, location_id) = match instance {
            Some(idx) => (
                Some(instances[idx].span),
                Some(instances[idx].location_id.clone()),
            ),
            None => fallback_span(state, projector, &row, assignment.date),
        };

        manual.push(ManualShift {
            assignment_index,
            clinician,
            date: assignment.date,
            is_on_call: on_call_class == Some(row.class_id()),
            row: Some(row),
            instance,
            span,
            location_id,
            blocks_whole_day: false,
        });
    }
    manual
}

/// Span and location of a pinned row with no instance on that date,
/// derived from the section's sub-shift times.
fn fallback_span(
    state: &StateSnapshot,
    projector: &CalendarProjector<'_>,
    row: &RowId,
    date: NaiveDate,
) -> (Option<MinuteSpan>, Option<String>) {
    let Some(section) = state.row(row.class_id()) else {
        return (None, None);
    };
    let location = section.location_id.clone();
    let Some(sub) = section.sub_shift(row.subshift_id()) else {
        return (None, location);
    };
    let (Some(start_raw), Some(end_raw)) = (sub.start_time.as_deref(), sub.end_time.as_deref())
    else {
        return (None, location);
    };
    let (Ok(start), Ok(end)) = (parse_hhmm(start_raw), parse_hhmm(end_raw)) else {
        return (None, location);
    };
    let offset = sub.end_day_offset.unwrap_or(0).max(0) as u32;
    let local = MinuteSpan::from_local(start, end, offset);
    (
        Some(local.offset_by_days(projector.day_index(date))),
        location,
    )
}

fn find_pin_conflicts(state: &StateSnapshot, manual: &[ManualShift]) -> Vec<PinConflict> {
    let mut conflicts = Vec::new();
    let mut push = |shift: &ManualShift, kind: PinConflictKind| {
        let assignment = &state.assignments[shift.assignment_index];
        conflicts.push(PinConflict {
            assignment_id: assignment.id.clone(),
            clinician_id: assignment.clinician_id.clone(),
            date: shift.date,
            kind,
        });
    };

    for shift in manual {
        let Some(row) = &shift.row else { continue };
        let clinician = &state.clinicians[shift.clinician];
        if !clinician.is_qualified_for(row.class_id()) {
            push(shift, PinConflictKind::UnqualifiedClinician);
        }
        if clinician.is_on_vacation(shift.date) {
            push(shift, PinConflictKind::OnVacation);
        }
    }

    for (i, a) in manual.iter().enumerate() {
        let (Some(_), Some(span_a)) = (&a.row, a.span) else { continue };
        for b in manual.iter().skip(i + 1) {
            if b.clinician != a.clinician {
                continue;
            }
            let (Some(_), Some(span_b)) = (&b.row, b.span) else { continue };
            if span_a.overlaps(span_b) {
                push(b, PinConflictKind::OverlappingPins);
            }
        }
    }

    conflicts
}

fn mandatory_window_admits(clinician: &Clinician, instance: &SlotInstance) -> bool {
    let mut saw_mandatory = false;
    for window in clinician.windows_for(instance.day_type) {
        if window.kind != WindowKind::Mandatory {
            continue;
        }
        saw_mandatory = true;
        if let Ok(span) = window.span() {
            if span.start <= instance.local.start && instance.local.end <= span.end {
                return true;
            }
        }
    }
    !saw_mandatory
}

fn preferred_window_miss(clinician: &Clinician, instance: &SlotInstance) -> i64 {
    let mut windows: Vec<MinuteSpan> = clinician
        .windows_for(instance.day_type)
        .filter(|w| w.kind == WindowKind::Preferred)
        .filter_map(|w| w.span().ok())
        .collect();
    if windows.is_empty() {
        return 0;
    }
    windows.sort_by_key(|w| w.start);

    let slot = instance.local;
    let mut covered = 0i64;
    let mut cursor = slot.start;
    for window in windows {
        let start = window.start.max(cursor).max(slot.start);
        let end = window.end.min(slot.end);
        if end > start {
            covered += end - start;
            cursor = end;
        }
    }
    slot.duration_minutes() - covered
}

#[cfg(test)]
#[path = "eligibility_tests.rs"]
mod tests;
