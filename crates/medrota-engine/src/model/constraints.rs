//! Hard constraints of the shard model.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use smallvec::SmallVec;

use medrota_core::time::MINUTES_PER_DAY;
use medrota_cp::BoolVar;

use super::ModelBuilder;

/// One slot of a clinician-day-location timeline: either a free decision
/// variable or a pinned constant.
#[derive(Debug, Clone, Copy)]
struct TimelineItem {
    start: i64,
    end: i64,
    var: Option<BoolVar>,
}

impl<'a> ModelBuilder<'a> {
    /// Capacity upper bound per instance; only posted in only-fill mode,
    /// distribute-all is bounded by feasibility alone.
    pub(super) fn post_capacity(&mut self) {
        if !self.only_fill_required {
            return;
        }
        for (instance_idx, pv_indices) in self.by_instance.iter().enumerate() {
            if pv_indices.is_empty() {
                continue;
            }
            let terms: Vec<(BoolVar, i64)> = pv_indices
                .iter()
                .map(|&idx| (self.pair_vars[idx].var, 1))
                .collect();
            self.cp
                .add_at_most(terms, i64::from(self.required_free[instance_idx]));
        }
    }

    /// No two time-overlapping assignments per clinician; absolute spans,
    /// so overnight shifts collide with the next day's slots.
    pub(super) fn post_no_overlap(&mut self) {
        let mut by_clinician: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (idx, pv) in self.pair_vars.iter().enumerate() {
            by_clinician.entry(pv.clinician).or_default().push(idx);
        }
        for indices in by_clinician.values() {
            for (pos, &i) in indices.iter().enumerate() {
                let span_i = self.instances[self.pair_vars[i].instance].span;
                for &j in &indices[pos + 1..] {
                    let span_j = self.instances[self.pair_vars[j].instance].span;
                    if span_i.overlaps(span_j) {
                        self.cp.add_at_most(
                            vec![(self.pair_vars[i].var, 1), (self.pair_vars[j].var, 1)],
                            1,
                        );
                    }
                }
            }
        }
    }

    /// At most one assignment per clinician and day when multi-shift days
    /// are disabled; a day holding a manual entry admits nothing further.
    pub(super) fn post_single_shift_per_day(&mut self) {
        if self.allow_multiple_shifts_per_day {
            return;
        }
        let groups: Vec<((usize, NaiveDate), SmallVec<[usize; 8]>)> = self
            .by_clinician_day
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        for ((clinician, date), pv_indices) in groups {
            if !self.manual_on(clinician, date).is_empty() {
                for idx in pv_indices {
                    let var = self.pair_vars[idx].var;
                    self.cp.fix(var, false);
                }
                continue;
            }
            let terms: Vec<(BoolVar, i64)> = pv_indices
                .iter()
                .map(|&idx| (self.pair_vars[idx].var, 1))
                .collect();
            self.cp.add_at_most(terms, 1);
        }
    }

    /// All of a clinician's assignments on one day share a location.
    pub(super) fn post_same_location(&mut self) {
        if !self.state.solver_settings.enforce_same_location_per_day {
            return;
        }
        let groups: Vec<((usize, NaiveDate), SmallVec<[usize; 8]>)> = self
            .by_clinician_day
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect();

        for ((clinician, date), pv_indices) in groups {
            // pairwise exclusion between different locations
            for (pos, &i) in pv_indices.iter().enumerate() {
                let loc_i = &self.instances[self.pair_vars[i].instance].location_id;
                for &j in &pv_indices[pos + 1..] {
                    let loc_j = &self.instances[self.pair_vars[j].instance].location_id;
                    if loc_i != loc_j {
                        self.cp.add_at_most(
                            vec![(self.pair_vars[i].var, 1), (self.pair_vars[j].var, 1)],
                            1,
                        );
                    }
                }
            }
            // a manual entry's location binds the whole day
            let manual_locations: BTreeSet<String> = self
                .manual_on(clinician, date)
                .iter()
                .filter_map(|&m| self.matrix.manual[m].location_id.clone())
                .collect();
            if manual_locations.is_empty() {
                continue;
            }
            for &idx in &pv_indices {
                let location = &self.instances[self.pair_vars[idx].instance].location_id;
                if !manual_locations.contains(location.as_str()) {
                    let var = self.pair_vars[idx].var;
                    self.cp.fix(var, false);
                }
            }
        }
    }

    /// Single contiguous block per clinician, day and location: for every
    /// pair of timeline items with a strict positive time gap, choosing
    /// both requires a chosen item in between.
    pub(super) fn post_continuity(&mut self) {
        if !self.state.solver_settings.prefer_continuous_shifts {
            return;
        }

        // (clinician, date, location) -> timeline
        let mut timelines: BTreeMap<(usize, NaiveDate, String), Vec<TimelineItem>> =
            BTreeMap::new();
        for pv in &self.pair_vars {
            let instance = &self.instances[pv.instance];
            timelines
                .entry((pv.clinician, instance.date, instance.location_id.clone()))
                .or_default()
                .push(TimelineItem {
                    start: instance.local.start,
                    end: instance.local.end,
                    var: Some(pv.var),
                });
        }

        // pinned entries join as constants
        let pinned: Vec<(usize, NaiveDate, Option<String>, Option<medrota_core::MinuteSpan>, i64)> =
            self.matrix
                .manual
                .iter()
                .filter(|m| m.row.is_some())
                .map(|m| {
                    let day_index = m
                        .date
                        .signed_duration_since(self.range_start)
                        .num_days();
                    (m.clinician, m.date, m.location_id.clone(), m.span, day_index)
                })
                .collect();
        for (clinician, date, location, span, day_index) in pinned {
            let (Some(location), Some(span)) = (location, span) else {
                continue;
            };
            let key = (clinician, date, location);
            // only days where free variables exist can still change
            if let Some(timeline) = timelines.get_mut(&key) {
                timeline.push(TimelineItem {
                    start: span.start - day_index * MINUTES_PER_DAY,
                    end: span.end - day_index * MINUTES_PER_DAY,
                    var: None,
                });
            }
        }

        let mut split_notes: BTreeSet<(usize, NaiveDate)> = BTreeSet::new();
        for ((clinician, date, _location), mut timeline) in timelines {
            timeline.sort_by_key(|item| (item.start, item.end));
            for i in 0..timeline.len() {
                for k in (i + 1)..timeline.len() {
                    if timeline[k].start <= timeline[i].end {
                        continue;
                    }
                    let middles = &timeline[i + 1..k];
                    // a pinned middle always bridges
                    if middles.iter().any(|m| m.var.is_none()) {
                        continue;
                    }
                    let pinned_endpoints = [timeline[i], timeline[k]]
                        .iter()
                        .filter(|item| item.var.is_none())
                        .count() as i64;
                    if pinned_endpoints == 2 {
                        // immutable inputs already split this day
                        if split_notes.insert((clinician, date)) {
                            self.notes.push(format!(
                                "Manual assignments for {} on {} form a split shift.",
                                self.state.clinicians[clinician].id, date
                            ));
                        }
                        continue;
                    }
                    let mut terms: Vec<(BoolVar, i64)> = Vec::new();
                    for item in [timeline[i], timeline[k]] {
                        if let Some(var) = item.var {
                            terms.push((var, 1));
                        }
                    }
                    for middle in middles {
                        if let Some(var) = middle.var {
                            terms.push((var, -1));
                        }
                    }
                    self.cp.add_at_most(terms, 1 - pinned_endpoints);
                }
            }
        }
    }

    /// Rest days around on-call: a chosen on-call shift excludes the
    /// clinician's other-section assignments on the surrounding days. In
    /// the soft form the combination is only penalized.
    pub(super) fn post_on_call_rest(&mut self) {
        let Some(on_call_class) = self.on_call_class().map(str::to_string) else {
            return;
        };
        let settings = &self.state.solver_settings;
        let before = settings.on_call_rest_days_before;
        let after = settings.on_call_rest_days_after;
        let hard = settings.on_call_rest_hard;
        let rest_weight = self.weights.rest;
        if before == 0 && after == 0 {
            return;
        }

        let is_on_call = |builder: &Self, pv_idx: usize| {
            builder.instances[builder.pair_vars[pv_idx].instance]
                .row
                .class_id()
                == on_call_class
        };

        let groups: Vec<((usize, NaiveDate), SmallVec<[usize; 8]>)> = self
            .by_clinician_day
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect();

        for ((clinician, date), pv_indices) in &groups {
            let on_call_vars: Vec<usize> = pv_indices
                .iter()
                .copied()
                .filter(|&idx| is_on_call(self, idx))
                .collect();
            if on_call_vars.is_empty() {
                continue;
            }

            let mut rest_days: Vec<NaiveDate> = Vec::new();
            for offset in 1..=before {
                rest_days.push(*date - chrono::Duration::days(offset));
            }
            for offset in 1..=after {
                rest_days.push(*date + chrono::Duration::days(offset));
            }

            for target in rest_days {
                // free non-on-call variables on the rest day
                let target_vars: Vec<BoolVar> = self
                    .by_clinician_day
                    .get(&(*clinician, target))
                    .map(|indices| {
                        indices
                            .iter()
                            .copied()
                            .filter(|&idx| !is_on_call(self, idx))
                            .map(|idx| self.pair_vars[idx].var)
                            .collect()
                    })
                    .unwrap_or_default();

                for &oc_idx in &on_call_vars {
                    let oc_var = self.pair_vars[oc_idx].var;
                    for &target_var in &target_vars {
                        if hard {
                            self.cp.add_at_most(vec![(oc_var, 1), (target_var, 1)], 1);
                        } else {
                            let label = format!("rest_viol_{}", self.cp.var_count());
                            let p = self.cp.new_bool_var(label);
                            self.cp.add_at_most(
                                vec![(oc_var, 1), (target_var, 1), (p, -1)],
                                1,
                            );
                            self.cp.add_objective_term(p, rest_weight);
                        }
                    }

                    // a manual entry on the rest day blocks choosing on-call
                    let manual_near: i64 = self
                        .manual_on(*clinician, target)
                        .iter()
                        .filter(|&&m| !self.matrix.manual[m].is_on_call)
                        .count() as i64;
                    if manual_near > 0 {
                        if hard {
                            self.cp.fix(oc_var, false);
                        } else {
                            self.cp.add_objective_term(oc_var, rest_weight * manual_near);
                        }
                    }
                }
            }
        }

        // Soft form only: nearby manual on-call entries charge free
        // variables instead of removing them from the domain.
        if !hard {
            let manual_on_call: Vec<(usize, NaiveDate)> = self
                .matrix
                .manual
                .iter()
                .filter(|shift| shift.is_on_call)
                .map(|shift| (shift.clinician, shift.date))
                .collect();
            for (clinician, date) in manual_on_call {
                for offset in 1..=after {
                    self.charge_rest_near_manual(
                        clinician,
                        date + chrono::Duration::days(offset),
                        &on_call_class,
                        rest_weight,
                    );
                }
                for offset in 1..=before {
                    self.charge_rest_near_manual(
                        clinician,
                        date - chrono::Duration::days(offset),
                        &on_call_class,
                        rest_weight,
                    );
                }
            }
        }
    }

    fn charge_rest_near_manual(
        &mut self,
        clinician: usize,
        date: NaiveDate,
        on_call_class: &str,
        rest_weight: i64,
    ) {
        let Some(indices) = self.by_clinician_day.get(&(clinician, date)) else {
            return;
        };
        let vars: Vec<BoolVar> = indices
            .iter()
            .filter(|&&idx| {
                self.instances[self.pair_vars[idx].instance].row.class_id() != on_call_class
            })
            .map(|&idx| self.pair_vars[idx].var)
            .collect();
        for var in vars {
            self.cp.add_objective_term(var, rest_weight);
        }
    }
}
