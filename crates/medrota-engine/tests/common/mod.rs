//! Shared helpers for the end-to-end solve tests.
#![allow(dead_code)]

use chrono::NaiveDate;

use medrota_core::domain::Assignment;
use medrota_core::state::StateSnapshot;
use medrota_engine::{solve_range, SolveParams, SolveRequest, SolveResponse};

pub use medrota_core::test_utils::*;

/// Test date: a Monday.
pub const MONDAY: &str = "2026-01-05";

pub fn date(iso: &str) -> NaiveDate {
    iso.parse().unwrap()
}

/// Solves one range with default parameters.
pub fn solve(state: &StateSnapshot, start: &str, end: &str, only_required: bool) -> SolveResponse {
    let mut request = SolveRequest::new(date(start), date(end));
    if only_required {
        request = request.only_required();
    }
    solve_range(state, &request, &SolveParams::default(), None).expect("solve must not error")
}

pub fn solve_day(state: &StateSnapshot, iso: &str, only_required: bool) -> SolveResponse {
    solve(state, iso, iso, only_required)
}

/// Non-pool assignments of one date.
pub fn day_assignments<'r>(response: &'r SolveResponse, iso: &str) -> Vec<&'r Assignment> {
    response
        .assignments
        .iter()
        .filter(|a| a.date == date(iso) && !a.row_id.starts_with("pool-"))
        .collect()
}

/// True when any clinician's assigned intervals on a date contain a
/// strict time gap, per the live stats evaluator.
pub fn has_split_shift(state: &StateSnapshot, response: &SolveResponse, iso: &str) -> bool {
    let day = date(iso);
    medrota_engine::evaluate_stats(state, &response.assignments, day, day).non_consecutive_shifts
        > 0
}
