//! Integration tests for the branch-and-bound search.

use std::time::Duration;

use super::*;
use crate::model::CpModel;
use crate::termination::{NoTermination, TimeTermination};

fn solve_to_end(model: &CpModel) -> SearchOutcome {
    BranchAndBound::new(model, NoTermination).solve(|_| SearchControl::Continue)
}

#[test]
fn picks_the_cheapest_assignment() {
    let mut model = CpModel::new();
    let a = model.new_bool_var("a");
    let b = model.new_bool_var("b");
    let c = model.new_bool_var("c");
    model.add_at_most(vec![(a, 1), (b, 1), (c, 1)], 1);
    model.add_objective_term(a, -10);
    model.add_objective_term(b, -5);
    model.add_objective_term(c, -1);

    let outcome = solve_to_end(&model);
    assert_eq!(outcome.status, SolveStatus::Optimal);
    let best = outcome.best.unwrap();
    assert_eq!(best.objective, -10);
    assert_eq!(best.values, vec![true, false, false]);
}

#[test]
fn covers_at_least_constraints_cheaply() {
    let mut model = CpModel::new();
    let a = model.new_bool_var("a");
    let b = model.new_bool_var("b");
    model.add_at_least(vec![(a, 1), (b, 1)], 1);
    model.add_objective_term(a, 5);
    model.add_objective_term(b, 3);

    let outcome = solve_to_end(&model);
    let best = outcome.best.unwrap();
    assert_eq!(best.objective, 3);
    assert_eq!(best.values, vec![false, true]);
}

#[test]
fn equality_selects_exact_count() {
    let mut model = CpModel::new();
    let a = model.new_bool_var("a");
    let b = model.new_bool_var("b");
    let c = model.new_bool_var("c");
    model.add_exactly(vec![(a, 1), (b, 1), (c, 1)], 2);
    model.add_objective_term(a, 1);
    model.add_objective_term(b, 2);
    model.add_objective_term(c, 3);

    let outcome = solve_to_end(&model);
    let best = outcome.best.unwrap();
    assert_eq!(best.objective, 3);
    assert_eq!(best.values, vec![true, true, false]);
}

#[test]
fn detects_infeasibility() {
    let mut model = CpModel::new();
    let x = model.new_bool_var("x");
    model.fix(x, true);
    model.add_at_most(vec![(x, 1)], 0);

    let outcome = solve_to_end(&model);
    assert_eq!(outcome.status, SolveStatus::Infeasible);
    assert!(outcome.best.is_none());
}

#[test]
fn pinned_variables_are_respected() {
    let mut model = CpModel::new();
    let x = model.new_bool_var("x");
    let y = model.new_bool_var("y");
    model.fix(x, true);
    model.add_at_most(vec![(x, 1), (y, 1)], 1);
    // y alone would be attractive, but the pin takes precedence
    model.add_objective_term(y, -100);
    model.add_objective_term(x, 1);

    let outcome = solve_to_end(&model);
    assert_eq!(outcome.status, SolveStatus::Optimal);
    let best = outcome.best.unwrap();
    assert_eq!(best.values, vec![true, false]);
    assert_eq!(best.objective, 1);
}

#[test]
fn objective_offset_is_reported() {
    let mut model = CpModel::new();
    let x = model.new_bool_var("x");
    model.add_objective_term(x, -1);
    model.add_objective_offset(100);

    let outcome = solve_to_end(&model);
    assert_eq!(outcome.best.unwrap().objective, 99);
}

#[test]
fn incumbents_strictly_improve() {
    // independent rewards: naive enumeration would visit many assignments
    let mut model = CpModel::new();
    let vars: Vec<_> = (0..6).map(|i| model.new_bool_var(format!("v{i}"))).collect();
    for (i, &v) in vars.iter().enumerate() {
        model.add_objective_term(v, -((i as i64) + 1));
    }
    // pairwise exclusion between neighbors keeps it non-trivial
    for pair in vars.windows(2) {
        model.add_at_most(vec![(pair[0], 1), (pair[1], 1)], 1);
    }

    let mut objectives = Vec::new();
    let outcome = BranchAndBound::new(&model, NoTermination).solve(|incumbent| {
        objectives.push(incumbent.objective);
        SearchControl::Continue
    });

    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert!(!objectives.is_empty());
    for window in objectives.windows(2) {
        assert!(window[1] < window[0], "incumbents must strictly improve");
    }
    // optimum: v1, v3, v5 (0-based indices 1, 3, 5) = -(2 + 4 + 6)
    assert_eq!(*objectives.last().unwrap(), -12);
}

#[test]
fn callback_can_abort() {
    let mut model = CpModel::new();
    let a = model.new_bool_var("a");
    let b = model.new_bool_var("b");
    model.add_objective_term(a, -1);
    model.add_objective_term(b, -1);

    let mut seen = 0;
    let outcome = BranchAndBound::new(&model, NoTermination).solve(|_| {
        seen += 1;
        SearchControl::Stop
    });

    assert_eq!(outcome.status, SolveStatus::Aborted);
    assert_eq!(seen, 1);
    assert!(outcome.best.is_some());
}

#[test]
fn zero_budget_reports_unknown() {
    let mut model = CpModel::new();
    for i in 0..8 {
        let v = model.new_bool_var(format!("v{i}"));
        model.add_objective_term(v, -1);
    }

    let outcome = BranchAndBound::new(&model, TimeTermination::new(Duration::ZERO))
        .with_check_interval(1)
        .solve(|_| SearchControl::Continue);

    assert_eq!(outcome.status, SolveStatus::Unknown);
    assert!(outcome.best.is_none());
}

#[test]
fn empty_model_is_trivially_optimal() {
    let mut model = CpModel::new();
    model.add_objective_offset(42);
    let outcome = solve_to_end(&model);
    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_eq!(outcome.best.unwrap().objective, 42);
}

#[test]
fn forced_chains_propagate() {
    // a >= 1 forces a; a + b <= 1 then forces !b
    let mut model = CpModel::new();
    let a = model.new_bool_var("a");
    let b = model.new_bool_var("b");
    model.add_at_least(vec![(a, 1)], 1);
    model.add_at_most(vec![(a, 1), (b, 1)], 1);
    model.add_objective_term(b, -100);

    let outcome = solve_to_end(&model);
    let best = outcome.best.unwrap();
    assert_eq!(best.values, vec![true, false]);
}
