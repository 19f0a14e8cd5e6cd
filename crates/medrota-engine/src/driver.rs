//! The solve driver: shards, deadlines, incumbent relay, response
//! shaping.
//!
//! One call owns one immutable normalized snapshot; the backend runs a
//! shard at a time under the global deadline, streaming every incumbent
//! to the observer together with live statistics.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{debug, info};

use medrota_core::eligibility;
use medrota_core::state::{normalize, StateSnapshot};
use medrota_core::{CalendarProjector, PinConflictKind, Result};
use medrota_cp::{
    BranchAndBound, ExternalTermination, OrTermination, SearchControl, SolveStatus,
    TimeTermination,
};

use crate::config::SolveParams;
use crate::diagnostics::{
    self, DebugInfo, RejectedPin, UncoveredSlot, REST_BOUNDARY_NOTE, UNFILLED_NOTE,
};
use crate::events::{IncumbentEvent, ObserverAction, SolveObserver};
use crate::extract::{self, ChosenSlot};
use crate::model::ModelBuilder;
use crate::request::{SolveRequest, SolveResponse};
use crate::stats;

/// Solves a range against a snapshot with default cancellation handling.
pub fn solve_range(
    snapshot: &StateSnapshot,
    request: &SolveRequest,
    params: &SolveParams,
    observer: Option<&dyn SolveObserver>,
) -> Result<SolveResponse> {
    solve_range_with_abort(
        snapshot,
        request,
        params,
        observer,
        Arc::new(AtomicBool::new(false)),
    )
}

pub(crate) fn solve_range_with_abort(
    snapshot: &StateSnapshot,
    request: &SolveRequest,
    params: &SolveParams,
    observer: Option<&dyn SolveObserver>,
    abort_flag: Arc<AtomicBool>,
) -> Result<SolveResponse> {
    let (start, end) = request.range()?;
    let (state, mut notes) = normalize(snapshot.clone());

    let solve_started = Instant::now();
    let deadline = solve_started + Duration::from_millis(params.time_limit_ms);
    let shards = split_shards(start, end, params.shard_days);
    let per_shard_ms = (params.time_limit_ms / shards.len() as u64).max(1);

    info!(
        %start,
        %end,
        shards = shards.len(),
        only_fill_required = request.only_fill_required,
        "solve started"
    );

    let full_projector = CalendarProjector::new(&state, start, end);
    let working_days_full = full_projector.working_days();

    let mut all_chosen: Vec<ChosenSlot> = Vec::new();
    let mut pinned_minutes: Vec<(usize, i64)> = Vec::new();
    let mut uncovered: Vec<UncoveredSlot> = Vec::new();
    let mut rejected: Vec<RejectedPin> = Vec::new();
    let mut statuses: Vec<SolveStatus> = Vec::new();
    let mut solution_count: u64 = 0;
    let mut completed_objective: i64 = 0;
    let mut rest_boundary = false;
    let mut aborted = false;

    for (shard_start, shard_end) in shards {
        if aborted {
            break;
        }
        let projector = CalendarProjector::new(&state, shard_start, shard_end);
        let instances = projector.instances();
        let matrix = eligibility::resolve(&state, &projector, &instances);

        rest_boundary |=
            diagnostics::has_rest_boundary_conflict(&state, &matrix, shard_start, shard_end);

        for shift in &matrix.manual {
            if shift.row.is_some() && shift.date >= shard_start && shift.date <= shard_end {
                if let Some(span) = shift.span {
                    pinned_minutes.push((shift.clinician, span.duration_minutes()));
                }
            }
        }

        if !matrix.pin_conflicts.is_empty() {
            // pins are immutable inputs; a conflicting pin makes its shard
            // infeasible while the other shards continue
            for conflict in &matrix.pin_conflicts {
                notes.push(format!(
                    "Manual assignment {} cannot be honored: {}.",
                    conflict.assignment_id,
                    reason_text(conflict.kind)
                ));
                rejected.push(RejectedPin {
                    assignment_id: conflict.assignment_id.clone(),
                    reason: conflict.kind,
                });
            }
            let (shard_uncovered, shard_notes) =
                diagnostics::shard_coverage(&instances, &matrix, &[]);
            uncovered.extend(shard_uncovered);
            notes.extend(shard_notes);
            statuses.push(SolveStatus::Infeasible);
            continue;
        }

        let built = ModelBuilder::new(
            &state,
            &instances,
            &matrix,
            params,
            request.only_fill_required,
            shard_start,
            shard_end,
            projector.working_days(),
        )
        .build();
        notes.extend(built.notes.iter().cloned());

        let remaining = deadline.saturating_duration_since(Instant::now());
        let budget = remaining.min(Duration::from_millis(per_shard_ms));
        let termination = OrTermination::new(
            TimeTermination::new(budget),
            ExternalTermination::new(abort_flag.clone()),
        );

        let outcome = BranchAndBound::new(&built.cp, termination)
            .with_check_interval(params.node_check_interval)
            .solve(|incumbent| {
                solution_count += 1;
                let Some(obs) = observer else {
                    return SearchControl::Continue;
                };
                let mut combined = all_chosen.clone();
                combined.extend(extract::decode(&built, &incumbent.values, &instances));
                let assignments = extract::extract_assignments(&state, start, end, &combined);
                let live = stats::evaluate(&state, &assignments, start, end);
                let event = IncumbentEvent {
                    solution_num: solution_count,
                    time_ms: solve_started.elapsed().as_millis() as u64,
                    objective: completed_objective + incumbent.objective,
                    assignments,
                };
                match obs.on_incumbent(&event, &live) {
                    ObserverAction::Continue => SearchControl::Continue,
                    ObserverAction::Stop => SearchControl::Stop,
                }
            });

        debug!(
            status = outcome.status.as_str(),
            incumbents = outcome.stats.incumbents,
            nodes = outcome.stats.nodes,
            "shard finished"
        );

        let shard_chosen = outcome
            .best
            .as_ref()
            .map(|best| extract::decode(&built, &best.values, &instances))
            .unwrap_or_default();
        let (shard_uncovered, shard_notes) =
            diagnostics::shard_coverage(&instances, &matrix, &shard_chosen);
        uncovered.extend(shard_uncovered);
        notes.extend(shard_notes);

        if let Some(best) = &outcome.best {
            completed_objective += best.objective;
        }
        if outcome.status == SolveStatus::Aborted {
            aborted = true;
        }
        statuses.push(outcome.status);
        all_chosen.extend(shard_chosen);
    }

    if rest_boundary {
        notes.push(REST_BOUNDARY_NOTE.to_string());
    }
    if !uncovered.is_empty() {
        notes.push(UNFILLED_NOTE.to_string());
    }

    let hours_violations =
        diagnostics::hours_violations(&state, &all_chosen, &pinned_minutes, working_days_full);
    let assignments = extract::extract_assignments(&state, start, end, &all_chosen);
    let solver_status = fold_statuses(&statuses);

    info!(
        status = solver_status.as_str(),
        assignments = assignments.len(),
        solutions = solution_count,
        "solve finished"
    );

    Ok(SolveResponse {
        start,
        end,
        assignments,
        notes,
        debug_info: DebugInfo {
            solver_status,
            time_ms: solve_started.elapsed().as_millis() as u64,
            solution_count,
            uncovered,
            hours_violations,
            rejected_pins: rejected,
        },
    })
}

/// Splits the inclusive range into consecutive shards.
fn split_shards(
    start: NaiveDate,
    end: NaiveDate,
    shard_days: Option<u32>,
) -> Vec<(NaiveDate, NaiveDate)> {
    let Some(days) = shard_days else {
        return vec![(start, end)];
    };
    let days = i64::from(days.max(1));
    let mut shards = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        let shard_end = (cursor + chrono::Duration::days(days - 1)).min(end);
        shards.push((cursor, shard_end));
        cursor = shard_end + chrono::Duration::days(1);
    }
    shards
}

/// Worst shard status wins; an abort outranks everything.
fn fold_statuses(statuses: &[SolveStatus]) -> SolveStatus {
    let mut folded = SolveStatus::Optimal;
    for &status in statuses {
        let rank = status_rank(status);
        if rank > status_rank(folded) {
            folded = status;
        }
    }
    folded
}

fn status_rank(status: SolveStatus) -> u8 {
    match status {
        SolveStatus::Optimal => 0,
        SolveStatus::Feasible => 1,
        SolveStatus::Unknown => 2,
        SolveStatus::Infeasible => 3,
        SolveStatus::Aborted => 4,
    }
}

fn reason_text(kind: PinConflictKind) -> &'static str {
    match kind {
        PinConflictKind::UnqualifiedClinician => "the clinician is not qualified for the section",
        PinConflictKind::OnVacation => "the clinician is on vacation",
        PinConflictKind::OverlappingPins => "it overlaps another manual assignment",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(iso: &str) -> NaiveDate {
        iso.parse().unwrap()
    }

    #[test]
    fn shards_cover_the_range_without_overlap() {
        let shards = split_shards(date("2026-01-05"), date("2026-01-18"), Some(7));
        assert_eq!(
            shards,
            vec![
                (date("2026-01-05"), date("2026-01-11")),
                (date("2026-01-12"), date("2026-01-18")),
            ]
        );

        let uneven = split_shards(date("2026-01-05"), date("2026-01-13"), Some(7));
        assert_eq!(uneven[1], (date("2026-01-12"), date("2026-01-13")));

        assert_eq!(
            split_shards(date("2026-01-05"), date("2026-01-18"), None),
            vec![(date("2026-01-05"), date("2026-01-18"))]
        );
    }

    #[test]
    fn status_folding_prefers_the_worst() {
        assert_eq!(
            fold_statuses(&[SolveStatus::Optimal, SolveStatus::Feasible]),
            SolveStatus::Feasible
        );
        assert_eq!(
            fold_statuses(&[SolveStatus::Infeasible, SolveStatus::Optimal]),
            SolveStatus::Infeasible
        );
        assert_eq!(
            fold_statuses(&[SolveStatus::Infeasible, SolveStatus::Aborted]),
            SolveStatus::Aborted
        );
        assert_eq!(fold_statuses(&[]), SolveStatus::Optimal);
    }
}
