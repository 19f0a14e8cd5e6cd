//! Depth-first branch-and-bound over the boolean model.
//!
//! Propagation keeps per-constraint activity bounds; the objective lower
//! bound prunes against the best incumbent, so incumbents are delivered
//! in strictly improving objective order.

use serde::Serialize;
use tracing::debug;

use crate::model::CpModel;
use crate::stats::SearchStats;
use crate::termination::{StopCause, Termination};

/// Terminal state of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// Search space exhausted with an incumbent: proven best.
    Optimal,
    /// Stopped on the time budget with an incumbent in hand.
    Feasible,
    /// Proven to have no solution.
    Infeasible,
    /// Stopped on the time budget before any incumbent.
    Unknown,
    /// Stopped by an external abort request.
    Aborted,
}

impl SolveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unknown => "UNKNOWN",
            SolveStatus::Aborted => "ABORTED",
        }
    }
}

/// Whether the caller wants the search to continue after an incumbent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchControl {
    Continue,
    Stop,
}

/// A feasible solution found during search.
#[derive(Debug, Clone)]
pub struct Incumbent {
    pub values: Vec<bool>,
    pub objective: i64,
}

/// Result of a search run.
#[derive(Debug)]
pub struct SearchOutcome {
    pub status: SolveStatus,
    pub best: Option<Incumbent>,
    pub stats: SearchStats,
}

/// Branch-and-bound driver for one model.
pub struct BranchAndBound<'m, T> {
    model: &'m CpModel,
    termination: T,
    check_interval: u64,
}

const DEFAULT_CHECK_INTERVAL: u64 = 256;

impl<'m, T: Termination> BranchAndBound<'m, T> {
    pub fn new(model: &'m CpModel, termination: T) -> Self {
        Self {
            model,
            termination,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    /// How many nodes between cooperative termination checks.
    pub fn with_check_interval(mut self, interval: u64) -> Self {
        self.check_interval = interval.max(1);
        self
    }

    /// Runs the search, invoking `on_incumbent` for every improving
    /// solution. The callback may answer [`SearchControl::Stop`] to abort.
    pub fn solve<F>(self, mut on_incumbent: F) -> SearchOutcome
    where
        F: FnMut(&Incumbent) -> SearchControl,
    {
        let mut engine = Engine::new(self.model);
        engine.stats.start();

        // Pins first, then a root propagation pass over every constraint.
        let feasible_root = engine.fix_pinned() && engine.propagate_all() && engine.propagate(0);
        if !feasible_root {
            debug!("root propagation proved infeasibility");
            return SearchOutcome {
                status: SolveStatus::Infeasible,
                best: None,
                stats: engine.stats,
            };
        }

        let mut best: Option<Incumbent> = None;
        let mut frames: Vec<Frame> = Vec::new();
        // Whether the current branch is still viable and we should descend.
        let mut descending = true;

        loop {
            if engine.stats.nodes % self.check_interval == 0 && engine.stats.nodes > 0 {
                if let Some(cause) = self.termination.check(&engine.stats) {
                    let status = match cause {
                        StopCause::External => SolveStatus::Aborted,
                        StopCause::TimeLimit if best.is_some() => SolveStatus::Feasible,
                        StopCause::TimeLimit => SolveStatus::Unknown,
                    };
                    return SearchOutcome {
                        status,
                        best,
                        stats: engine.stats,
                    };
                }
            }

            if descending {
                match engine.pick_unfixed() {
                    None => {
                        // Full assignment: a new incumbent by construction,
                        // pruning guarantees it improves on the previous one.
                        let incumbent = Incumbent {
                            values: engine.snapshot(),
                            objective: engine.obj_fixed + self.model.objective_offset(),
                        };
                        engine.stats.record_incumbent();
                        debug!(
                            objective = incumbent.objective,
                            nodes = engine.stats.nodes,
                            "incumbent found"
                        );
                        let control = on_incumbent(&incumbent);
                        best = Some(incumbent);
                        if control == SearchControl::Stop {
                            return SearchOutcome {
                                status: SolveStatus::Aborted,
                                best,
                                stats: engine.stats,
                            };
                        }
                        descending = false;
                    }
                    Some(var) => {
                        let value = engine.preferred_value(var);
                        frames.push(Frame {
                            var,
                            first_value: value,
                            tried_both: false,
                            trail_mark: engine.trail_len(),
                        });
                        descending = engine.decide(var, value, best.as_ref());
                    }
                }
            } else {
                engine.stats.record_conflict();
                // Backtrack to the deepest frame with an untried branch.
                loop {
                    let Some(frame) = frames.pop() else {
                        let status = if best.is_some() {
                            SolveStatus::Optimal
                        } else {
                            SolveStatus::Infeasible
                        };
                        return SearchOutcome {
                            status,
                            best,
                            stats: engine.stats,
                        };
                    };
                    engine.undo_to(frame.trail_mark);
                    if !frame.tried_both {
                        let second = !frame.first_value;
                        frames.push(Frame {
                            tried_both: true,
                            ..frame
                        });
                        descending = engine.decide(frame.var, second, best.as_ref());
                        break;
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    var: usize,
    first_value: bool,
    tried_both: bool,
    trail_mark: usize,
}

/// Mutable search state: partial assignment, activity bounds, trail.
struct Engine<'m> {
    model: &'m CpModel,
    /// var -> (constraint index, coefficient)
    occ: Vec<Vec<(u32, i64)>>,
    min_act: Vec<i64>,
    max_act: Vec<i64>,
    values: Vec<i8>,
    trail: Vec<u32>,
    obj_fixed: i64,
    obj_pending_min: i64,
    /// Branch order: largest objective impact first.
    order: Vec<u32>,
    stats: SearchStats,
}

impl<'m> Engine<'m> {
    fn new(model: &'m CpModel) -> Self {
        let n = model.var_count();
        let mut occ: Vec<Vec<(u32, i64)>> = vec![Vec::new(); n];
        let mut min_act = Vec::with_capacity(model.constraint_count());
        let mut max_act = Vec::with_capacity(model.constraint_count());

        for (ci, constraint) in model.constraints().iter().enumerate() {
            let mut lo = 0i64;
            let mut hi = 0i64;
            for &(var, coeff) in &constraint.terms {
                occ[var.index()].push((ci as u32, coeff));
                lo += coeff.min(0);
                hi += coeff.max(0);
            }
            min_act.push(lo);
            max_act.push(hi);
        }

        let objective = model.objective();
        let obj_pending_min = objective.iter().map(|c| c.min(&0)).sum();

        let mut order: Vec<u32> = (0..n as u32).collect();
        order.sort_by_key(|&v| (-objective[v as usize].abs(), v));

        Self {
            model,
            occ,
            min_act,
            max_act,
            values: vec![-1; n],
            trail: Vec::with_capacity(n),
            obj_fixed: 0,
            obj_pending_min,
            order,
            stats: SearchStats::default(),
        }
    }

    fn trail_len(&self) -> usize {
        self.trail.len()
    }

    fn snapshot(&self) -> Vec<bool> {
        self.values.iter().map(|&v| v == 1).collect()
    }

    fn pick_unfixed(&self) -> Option<usize> {
        self.order
            .iter()
            .map(|&v| v as usize)
            .find(|&v| self.values[v] < 0)
    }

    fn preferred_value(&self, var: usize) -> bool {
        // For minimization, take the objective-reducing branch first.
        self.model.objective()[var] < 0
    }

    /// One decision: assign, propagate, prune against the incumbent.
    fn decide(&mut self, var: usize, value: bool, best: Option<&Incumbent>) -> bool {
        self.stats.record_node();
        let mark = self.trail.len();
        if !self.assign(var, value) {
            return false;
        }
        if !self.propagate(mark) {
            return false;
        }
        match best {
            Some(incumbent) => self.lower_bound() < incumbent.objective,
            None => true,
        }
    }

    fn lower_bound(&self) -> i64 {
        self.obj_fixed + self.obj_pending_min + self.model.objective_offset()
    }

    fn fix_pinned(&mut self) -> bool {
        let fixed: Vec<(usize, bool)> = self
            .model
            .fixed()
            .iter()
            .enumerate()
            .filter_map(|(v, f)| f.map(|b| (v, b)))
            .collect();
        for (var, value) in fixed {
            if self.values[var] >= 0 {
                if (self.values[var] == 1) != value {
                    return false;
                }
                continue;
            }
            if !self.assign(var, value) {
                return false;
            }
        }
        true
    }

    fn assign(&mut self, var: usize, value: bool) -> bool {
        debug_assert!(self.values[var] < 0);
        self.values[var] = value as i8;
        self.trail.push(var as u32);

        let coeff = self.model.objective()[var];
        self.obj_pending_min -= coeff.min(0);
        if value {
            self.obj_fixed += coeff;
        }

        let model = self.model;
        let mut ok = true;
        for &(ci, a) in &self.occ[var] {
            let ci = ci as usize;
            let taken = if value { a } else { 0 };
            self.min_act[ci] += taken - a.min(0);
            self.max_act[ci] += taken - a.max(0);
            let constraint = &model.constraints()[ci];
            if self.min_act[ci] > constraint.upper || self.max_act[ci] < constraint.lower {
                ok = false;
            }
        }
        ok
    }

    fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let Some(var) = self.trail.pop() else { break };
            let var = var as usize;
            let value = self.values[var] == 1;
            self.values[var] = -1;

            let coeff = self.model.objective()[var];
            self.obj_pending_min += coeff.min(0);
            if value {
                self.obj_fixed -= coeff;
            }

            for &(ci, a) in &self.occ[var] {
                let ci = ci as usize;
                let taken = if value { a } else { 0 };
                self.min_act[ci] -= taken - a.min(0);
                self.max_act[ci] -= taken - a.max(0);
            }
        }
    }

    /// Unit-style propagation for every constraint; used once at the root.
    fn propagate_all(&mut self) -> bool {
        for ci in 0..self.model.constraint_count() {
            if !self.propagate_constraint(ci) {
                return false;
            }
        }
        true
    }

    /// Propagates from the trail position `cursor` to fixpoint.
    fn propagate(&mut self, mut cursor: usize) -> bool {
        while cursor < self.trail.len() {
            let var = self.trail[cursor] as usize;
            cursor += 1;
            for i in 0..self.occ[var].len() {
                let (ci, _) = self.occ[var][i];
                if !self.propagate_constraint(ci as usize) {
                    return false;
                }
            }
        }
        true
    }

    fn propagate_constraint(&mut self, ci: usize) -> bool {
        let model = self.model;
        let constraint = &model.constraints()[ci];
        let min_act = self.min_act[ci];
        let max_act = self.max_act[ci];
        if min_act > constraint.upper || max_act < constraint.lower {
            return false;
        }

        let mut forced: Vec<(usize, bool)> = Vec::new();
        for &(var, a) in &constraint.terms {
            let v = var.index();
            if self.values[v] >= 0 {
                continue;
            }
            let (cannot_be_one, cannot_be_zero) = if a > 0 {
                (
                    min_act + a > constraint.upper,
                    max_act - a < constraint.lower,
                )
            } else {
                (
                    max_act + a < constraint.lower,
                    min_act - a > constraint.upper,
                )
            };
            match (cannot_be_one, cannot_be_zero) {
                (true, true) => return false,
                (true, false) => forced.push((v, false)),
                (false, true) => forced.push((v, true)),
                (false, false) => {}
            }
        }

        for (v, b) in forced {
            if self.values[v] >= 0 {
                if (self.values[v] == 1) != b {
                    return false;
                }
                continue;
            }
            if !self.assign(v, b) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
