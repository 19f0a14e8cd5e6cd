//! Assignment extraction: decision vector to canonical records.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use medrota_core::domain::Assignment;
use medrota_core::ids::RowId;
use medrota_core::state::StateSnapshot;
use medrota_core::time::MinuteSpan;
use medrota_core::SlotInstance;

use crate::model::{BuiltModel, PairVar};

/// One chosen (clinician, slot instance), shard-independent.
#[derive(Debug, Clone)]
pub struct ChosenSlot {
    pub clinician: usize,
    pub date: NaiveDate,
    pub row: RowId,
    pub location_id: String,
    /// Minutes within the day.
    pub local: MinuteSpan,
    /// Index of the chosen instance within its (row, date) bucket,
    /// ordered by start time. Becomes the record's sequence number, so
    /// consumers can recover the exact interval behind a record.
    pub seq: u32,
}

/// Decodes a search solution into chosen slots.
pub fn decode(model: &BuiltModel, values: &[bool], instances: &[SlotInstance]) -> Vec<ChosenSlot> {
    // bucket-relative position of every instance, by start time
    let mut buckets: BTreeMap<(RowId, NaiveDate), Vec<usize>> = BTreeMap::new();
    for (idx, instance) in instances.iter().enumerate() {
        buckets
            .entry((instance.row.clone(), instance.date))
            .or_default()
            .push(idx);
    }
    let mut seq_of = vec![0u32; instances.len()];
    for bucket in buckets.values_mut() {
        bucket.sort_by_key(|&idx| (instances[idx].local.start, instances[idx].local.end));
        for (pos, &idx) in bucket.iter().enumerate() {
            seq_of[idx] = pos as u32;
        }
    }

    model
        .pair_vars
        .iter()
        .filter(|pv| values[pv.var.index()])
        .map(|pv: &PairVar| {
            let instance = &instances[pv.instance];
            ChosenSlot {
                clinician: pv.clinician,
                date: instance.date,
                row: instance.row.clone(),
                location_id: instance.location_id.clone(),
                local: instance.local,
                seq: seq_of[pv.instance],
            }
        })
        .collect()
}

/// Shapes the final assignment list: manual records untouched, solver
/// records with canonical ids, everything in canonical order.
///
/// Canonical id: `a-<row>-<date>-<clinician>-<seq>`; at most one record
/// per (row, date, clinician, seq).
pub fn extract_assignments(
    state: &StateSnapshot,
    start: NaiveDate,
    end: NaiveDate,
    chosen: &[ChosenSlot],
) -> Vec<Assignment> {
    let mut output: Vec<Assignment> = Vec::new();

    // manual pass-through, including pool rows
    for assignment in &state.assignments {
        if assignment.manual && assignment.date >= start && assignment.date <= end {
            output.push(assignment.clone());
        }
    }

    let mut seen: BTreeMap<(String, NaiveDate, String, u32), ()> = BTreeMap::new();
    for slot in chosen {
        let clinician_id = state.clinicians[slot.clinician].id.clone();
        let row_id = slot.row.to_string();
        if seen
            .insert((row_id.clone(), slot.date, clinician_id.clone(), slot.seq), ())
            .is_some()
        {
            continue;
        }
        output.push(Assignment {
            id: format!("a-{row_id}-{}-{clinician_id}-{}", slot.date, slot.seq),
            row_id,
            date: slot.date,
            clinician_id,
            manual: false,
        });
    }

    output.sort_by(|a, b| {
        (a.date, &a.row_id, &a.clinician_id, &a.id).cmp(&(b.date, &b.row_id, &b.clinician_id, &b.id))
    });
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use medrota_core::state::normalize;
    use medrota_core::test_utils::state_with_single_slot;

    fn date(iso: &str) -> NaiveDate {
        iso.parse().unwrap()
    }

    fn chosen(clinician: usize, iso: &str, row: &str, start: i64, end: i64, seq: u32) -> ChosenSlot {
        ChosenSlot {
            clinician,
            date: date(iso),
            row: RowId::parse(row),
            location_id: "loc-default".to_string(),
            local: MinuteSpan::new(start, end),
            seq,
        }
    }

    #[test]
    fn solver_records_get_canonical_ids_in_order() {
        let (state, _) = normalize(state_with_single_slot("section-a", 1, "08:00", "16:00"));
        let slots = vec![
            chosen(0, "2026-01-06", "section-a::s1", 480, 960, 0),
            chosen(0, "2026-01-05", "section-a::s1", 480, 960, 0),
        ];
        let assignments =
            extract_assignments(&state, date("2026-01-05"), date("2026-01-11"), &slots);

        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].date, date("2026-01-05"));
        assert_eq!(assignments[0].id, "a-section-a::s1-2026-01-05-clin-1-0");
        assert_eq!(assignments[1].date, date("2026-01-06"));
    }

    #[test]
    fn same_bucket_instances_are_seq_numbered_by_start() {
        let (state, _) = normalize(state_with_single_slot("section-a", 1, "08:00", "16:00"));
        let slots = vec![
            chosen(0, "2026-01-05", "section-a::s1", 720, 960, 1),
            chosen(0, "2026-01-05", "section-a::s1", 480, 720, 0),
        ];
        let assignments =
            extract_assignments(&state, date("2026-01-05"), date("2026-01-05"), &slots);

        assert_eq!(assignments.len(), 2);
        // the earlier shift takes seq 0
        assert_eq!(assignments[0].id, "a-section-a::s1-2026-01-05-clin-1-0");
        assert_eq!(assignments[1].id, "a-section-a::s1-2026-01-05-clin-1-1");
    }

    #[test]
    fn manual_records_pass_through_unchanged() {
        let mut raw = state_with_single_slot("section-a", 1, "08:00", "16:00");
        raw.assignments.push(Assignment::manual(
            "my-pin",
            "section-a::s1",
            date("2026-01-05"),
            "clin-1",
        ));
        let (state, _) = normalize(raw);

        let assignments = extract_assignments(&state, date("2026-01-05"), date("2026-01-05"), &[]);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].id, "my-pin");
        assert!(assignments[0].manual);
    }

    #[test]
    fn manual_outside_range_is_not_emitted() {
        let mut raw = state_with_single_slot("section-a", 1, "08:00", "16:00");
        raw.assignments.push(Assignment::manual(
            "far-away",
            "section-a::s1",
            date("2026-03-01"),
            "clin-1",
        ));
        let (state, _) = normalize(raw);
        let assignments = extract_assignments(&state, date("2026-01-05"), date("2026-01-05"), &[]);
        assert!(assignments.is_empty());
    }
}
