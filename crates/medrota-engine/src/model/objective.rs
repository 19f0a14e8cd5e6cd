//! Soft terms of the shard model's minimized objective.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use medrota_cp::BoolVar;

use super::ModelBuilder;

/// Bits needed to represent values up to `n` in a binary slack ladder.
fn ladder_bits(n: i64) -> u32 {
    debug_assert!(n > 0);
    64 - (n as u64).leading_zeros()
}

impl<'a> ModelBuilder<'a> {
    /// Coverage reward: one `coverage` weight per filled required head,
    /// offset so the objective carries the shortfall penalty.
    pub(super) fn add_coverage_objective(&mut self) {
        let coverage = self.weights.coverage;
        for (instance_idx, pv_indices) in self.by_instance.iter().enumerate() {
            let required_free = i64::from(self.required_free[instance_idx]);
            if required_free == 0 {
                continue;
            }
            self.cp.add_objective_offset(required_free * coverage);
            if pv_indices.is_empty() {
                continue;
            }
            if self.only_fill_required {
                // capacity caps the sum at the open head-count, so every
                // chosen variable is a covered head
                for &idx in pv_indices {
                    let var = self.pair_vars[idx].var;
                    self.cp.add_objective_term(var, -coverage);
                }
            } else {
                // distribute-all has no capacity cap; count covered heads
                // with indicator booleans bounded by the assigned sum
                let mut counter_terms: Vec<(BoolVar, i64)> = Vec::new();
                for k in 0..required_free {
                    let head = self
                        .cp
                        .new_bool_var(format!("covered_{instance_idx}_{k}"));
                    self.cp.add_objective_term(head, -coverage);
                    counter_terms.push((head, 1));
                }
                for &idx in pv_indices {
                    counter_terms.push((self.pair_vars[idx].var, -1));
                }
                self.cp.add_at_most(counter_terms, 0);
            }
        }
    }

    /// Per-assignment costs: preference rank, preferred-window miss and
    /// the distribute-all fill reward.
    pub(super) fn add_assignment_costs(&mut self) {
        let weights = self.weights;
        for pv_idx in 0..self.pair_vars.len() {
            let pv = self.pair_vars[pv_idx];
            let pair = &self.matrix.pairs[pv.pair];
            let has_preferences =
                !self.state.clinicians[pv.clinician].preferred_class_ids.is_empty();
            let mut cost = weights.preference_cost(pair.preference_rank, has_preferences);
            cost += pair.window_miss_minutes * weights.window_per_minute;
            if !self.only_fill_required {
                cost -= weights.fill;
            }
            if cost != 0 {
                self.cp.add_objective_term(pv.var, cost);
            }
        }
    }

    /// Location-spread penalty when same-location is not enforced: each
    /// additional location a clinician touches on a day costs one weight.
    pub(super) fn add_location_spread(&mut self) {
        if self.state.solver_settings.enforce_same_location_per_day {
            return;
        }
        let location_weight = self.weights.location;

        let groups: Vec<((usize, NaiveDate), Vec<usize>)> = self
            .by_clinician_day
            .iter()
            .map(|(k, v)| (*k, v.to_vec()))
            .collect();

        for ((clinician, date), pv_indices) in groups {
            let mut by_location: BTreeMap<String, Vec<BoolVar>> = BTreeMap::new();
            for &idx in &pv_indices {
                let instance = &self.instances[self.pair_vars[idx].instance];
                by_location
                    .entry(instance.location_id.clone())
                    .or_default()
                    .push(self.pair_vars[idx].var);
            }
            let pinned_locations: BTreeSet<String> = self
                .manual_on(clinician, date)
                .iter()
                .filter_map(|&m| self.matrix.manual[m].location_id.clone())
                .collect();

            let free_only: Vec<(&String, &Vec<BoolVar>)> = by_location
                .iter()
                .filter(|(location, _)| !pinned_locations.contains(*location))
                .collect();
            if pinned_locations.len() + free_only.len() < 2 {
                continue;
            }

            let mut used_vars: Vec<(String, Vec<BoolVar>)> = Vec::new();
            for (location, vars) in free_only {
                used_vars.push((location.clone(), vars.clone()));
            }

            let mut all_vars: Vec<BoolVar> = Vec::new();
            for (_, vars) in &used_vars {
                all_vars.extend(vars.iter().copied());
            }

            for (location, vars) in used_vars {
                let used = self
                    .cp
                    .new_bool_var(format!("loc_used_{clinician}_{date}_{location}"));
                for var in vars {
                    // x <= used
                    self.cp.add_at_most(vec![(var, 1), (used, -1)], 0);
                }
                self.cp.add_objective_term(used, location_weight);
            }

            if pinned_locations.is_empty() {
                // the first location of the day is free of charge
                let active = self
                    .cp
                    .new_bool_var(format!("day_active_{clinician}_{date}"));
                let mut terms: Vec<(BoolVar, i64)> = vec![(active, 1)];
                for var in all_vars {
                    terms.push((var, -1));
                }
                self.cp.add_at_most(terms, 0);
                self.cp.add_objective_term(active, -location_weight);
            } else {
                self.cp.add_objective_offset(
                    location_weight * (pinned_locations.len() as i64 - 1),
                );
            }
        }
    }

    /// Working-hours deviation: piecewise linear outside the tolerance
    /// band, encoded with binary over/under slack ladders so the backend
    /// stays purely boolean.
    pub(super) fn add_working_hours(&mut self) {
        let hours_weight = self.weights.hours_per_minute;
        let default_tolerance = self.state.solver_settings.working_hours_tolerance_hours;
        let scale_num = i64::from(self.working_days);

        let mut vars_by_clinician: BTreeMap<usize, Vec<(BoolVar, i64)>> = BTreeMap::new();
        for pv in &self.pair_vars {
            let duration = self.instances[pv.instance].local.duration_minutes();
            vars_by_clinician
                .entry(pv.clinician)
                .or_default()
                .push((pv.var, duration));
        }

        let mut pinned_minutes: BTreeMap<usize, i64> = BTreeMap::new();
        for shift in &self.matrix.manual {
            if shift.row.is_none() || shift.date < self.range_start || shift.date > self.range_end
            {
                continue;
            }
            if let Some(span) = shift.span {
                *pinned_minutes.entry(shift.clinician).or_insert(0) += span.duration_minutes();
            }
        }

        let clinician_targets: Vec<(usize, i64, i64)> = self
            .state
            .clinicians
            .iter()
            .enumerate()
            .filter_map(|(idx, clinician)| {
                let hours_per_week = clinician.working_hours_per_week?;
                let target =
                    (hours_per_week * 60.0 * scale_num as f64 / 5.0).round() as i64;
                let tolerance_hours = clinician
                    .working_hours_tolerance_hours
                    .unwrap_or(default_tolerance);
                let tolerance = (tolerance_hours * 60.0).round() as i64;
                Some((idx, target, tolerance))
            })
            .collect();

        for (clinician, target, tolerance) in clinician_targets {
            let Some(duration_terms) = vars_by_clinician.get(&clinician).cloned() else {
                continue;
            };
            let pinned = pinned_minutes.get(&clinician).copied().unwrap_or(0);
            let max_minutes: i64 =
                pinned + duration_terms.iter().map(|(_, d)| *d).sum::<i64>();

            // over side: sum(dur * x) + pinned - (target + tolerance) <= over
            let max_over = max_minutes - (target + tolerance);
            if max_over > 0 {
                let mut terms: Vec<(BoolVar, i64)> = Vec::new();
                for bit in 0..ladder_bits(max_over) {
                    let over = self
                        .cp
                        .new_bool_var(format!("hours_over_{clinician}_{bit}"));
                    let weight = 1i64 << bit;
                    self.cp.add_objective_term(over, hours_weight * weight);
                    terms.push((over, weight));
                }
                for &(var, duration) in &duration_terms {
                    terms.push((var, -duration));
                }
                // sum(2^b * over_b) >= sum(dur * x) - (target + tol - pinned)
                self.cp.add_at_least(terms, pinned - (target + tolerance));
            }

            // under side: (target - tolerance) - pinned - sum(dur * x) <= under
            let max_under = (target - tolerance) - pinned;
            if max_under > 0 {
                let mut terms: Vec<(BoolVar, i64)> = Vec::new();
                for bit in 0..ladder_bits(max_under) {
                    let under = self
                        .cp
                        .new_bool_var(format!("hours_under_{clinician}_{bit}"));
                    let weight = 1i64 << bit;
                    self.cp.add_objective_term(under, hours_weight * weight);
                    terms.push((under, weight));
                }
                for &(var, duration) in &duration_terms {
                    terms.push((var, duration));
                }
                self.cp.add_at_least(terms, max_under);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ladder_bits;

    #[test]
    fn ladder_bits_cover_the_range() {
        assert_eq!(ladder_bits(1), 1);
        assert_eq!(ladder_bits(2), 2);
        assert_eq!(ladder_bits(3), 2);
        assert_eq!(ladder_bits(480), 9);
        for n in 1..=1024i64 {
            let bits = ladder_bits(n);
            assert!((1i64 << bits) - 1 >= n);
        }
    }
}
