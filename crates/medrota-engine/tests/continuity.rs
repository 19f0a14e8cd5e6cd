//! Continuity scenarios: a clinician's day never contains a split shift.

mod common;

use common::*;

use medrota_core::domain::{Assignment, DayType};
use medrota_core::state::normalize;
use medrota_core::StateSnapshot;

fn normalized(raw: &StateSnapshot) -> StateSnapshot {
    normalize(raw.clone()).0
}

/// Three consecutive slots with required head-counts.
fn consecutive_slots(raw: &mut StateSnapshot, times: &[(&str, &str, u32)]) {
    raw.weekly_template.locations[0].slots.clear();
    for (idx, (start, end, required)) in times.iter().enumerate() {
        add_slot(
            raw,
            &format!("slot-{}__mon", idx + 1),
            "section-a",
            DayType::Mon,
            *required,
            start,
            end,
        );
    }
}

#[test]
fn prevents_gap_between_required_slots() {
    // first and last required; the middle is not available in only-fill
    // mode, so only one end can be staffed
    let mut raw = state_with_single_slot("section-a", 0, "00:00", "00:00");
    consecutive_slots(&mut raw, &[("08:00", "12:00", 1), ("12:00", "16:00", 0), ("16:00", "20:00", 1)]);

    let response = solve_day(&raw, MONDAY, true);
    let state = normalized(&raw);

    assert!(!has_split_shift(&state, &response, MONDAY));
    assert_eq!(day_assignments(&response, MONDAY).len(), 1);
}

#[test]
fn fills_a_continuous_block_completely() {
    let mut raw = state_with_single_slot("section-a", 0, "00:00", "00:00");
    consecutive_slots(&mut raw, &[("08:00", "12:00", 1), ("12:00", "16:00", 1), ("16:00", "20:00", 1)]);

    let response = solve_day(&raw, MONDAY, true);
    let state = normalized(&raw);

    let day = day_assignments(&response, MONDAY);
    assert_eq!(day.len(), 3);
    let clinicians: std::collections::BTreeSet<&str> =
        day.iter().map(|a| a.clinician_id.as_str()).collect();
    assert_eq!(clinicians.len(), 1);
    assert!(!has_split_shift(&state, &response, MONDAY));
}

#[test]
fn each_of_several_clinicians_stays_continuous() {
    let mut raw = state_with_single_slot("section-a", 0, "00:00", "00:00");
    consecutive_slots(&mut raw, &[("08:00", "12:00", 1), ("12:00", "16:00", 1), ("16:00", "20:00", 1)]);
    raw.clinicians.push(make_clinician("clin-2", &["section-a"]));

    let response = solve_day(&raw, MONDAY, true);
    let state = normalized(&raw);

    assert_eq!(day_assignments(&response, MONDAY).len(), 3);
    assert!(!has_split_shift(&state, &response, MONDAY));
}

#[test]
fn extends_a_manual_assignment_continuously() {
    let mut raw = state_with_single_slot("section-a", 0, "00:00", "00:00");
    consecutive_slots(&mut raw, &[("08:00", "12:00", 1), ("12:00", "16:00", 1), ("16:00", "20:00", 1)]);
    // pin the morning; it maps onto the earliest instance of the bucket
    raw.assignments.push(Assignment::manual(
        "pin-morning",
        "section-a::s1",
        date(MONDAY),
        "clin-1",
    ));

    let response = solve_day(&raw, MONDAY, true);
    let state = normalized(&raw);

    let day = day_assignments(&response, MONDAY);
    assert_eq!(day.len(), 3);
    assert!(day.iter().any(|a| a.id == "pin-morning" && a.manual));
    assert!(!has_split_shift(&state, &response, MONDAY));
}

#[test]
fn overnight_shifts_chain_without_a_gap() {
    let mut raw = state_with_single_slot("section-a", 0, "00:00", "00:00");
    raw.weekly_template.locations[0].slots.clear();
    add_slot(&mut raw, "slot-eve__mon", "section-a", DayType::Mon, 1, "14:00", "22:00");
    add_slot(&mut raw, "slot-night__mon", "section-a", DayType::Mon, 1, "22:00", "06:00");

    let response = solve_day(&raw, MONDAY, true);
    let state = normalized(&raw);

    assert_eq!(day_assignments(&response, MONDAY).len(), 2);
    assert!(!has_split_shift(&state, &response, MONDAY));
}

#[test]
fn competing_clinician_cannot_force_a_split() {
    // Bob is only qualified for the bridge slot; whatever the solver
    // does, Marie must not end up with the two outer slots
    let mut raw = state_with_single_slot("tout-matin", 0, "00:00", "00:00");
    raw.weekly_template.locations[0].slots.clear();
    add_section(&mut raw, "irm-tout");
    add_section(&mut raw, "irm-seno");
    add_slot(&mut raw, "slot-early__mon", "tout-matin", DayType::Mon, 1, "06:30", "07:30");
    add_slot(&mut raw, "slot-bridge__mon", "irm-tout", DayType::Mon, 1, "07:30", "11:30");
    add_slot(&mut raw, "slot-late__mon", "irm-seno", DayType::Mon, 1, "11:30", "15:30");
    raw.clinicians[0] = make_clinician("clin-marie", &["tout-matin", "irm-tout", "irm-seno"]);
    raw.clinicians.push(make_clinician("clin-bob", &["irm-tout"]));
    raw.solver_settings.enforce_same_location_per_day = true;

    let response = solve_day(&raw, MONDAY, true);
    let state = normalized(&raw);

    assert!(!has_split_shift(&state, &response, MONDAY));
    // full coverage is only reachable through contiguous runs (for
    // instance Marie working 06:30-15:30 straight through)
    assert_eq!(day_assignments(&response, MONDAY).len(), 3);
    assert!(response.debug_info.uncovered.is_empty());
}

#[test]
fn distribute_all_mode_still_forbids_gaps() {
    let mut raw = state_with_single_slot("section-a", 0, "00:00", "00:00");
    consecutive_slots(&mut raw, &[("08:00", "12:00", 0), ("12:00", "16:00", 0), ("16:00", "20:00", 0)]);
    raw.clinicians.push(make_clinician("clin-2", &["section-a"]));

    let response = solve_day(&raw, MONDAY, false);
    let state = normalized(&raw);

    assert!(
        !day_assignments(&response, MONDAY).is_empty(),
        "distribute-all should hand out optional slots"
    );
    assert!(!has_split_shift(&state, &response, MONDAY));
}
