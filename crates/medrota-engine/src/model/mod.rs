//! Builds the CP model for one shard: decision variables, hard
//! constraints and the weighted objective.
//!
//! Manual assignments are constants, not variables; they shape capacities
//! and exclusions but are never re-decided. Decision variables exist only
//! for eligible (clinician, slot instance) pairs.

mod constraints;
mod objective;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use smallvec::SmallVec;
use tracing::debug;

use medrota_core::eligibility::EligibilityMatrix;
use medrota_core::state::StateSnapshot;
use medrota_core::SlotInstance;
use medrota_cp::{BoolVar, CpModel};

use crate::config::SolveParams;
use crate::weights::Weights;

/// A decision variable and the pair it stands for.
#[derive(Debug, Clone, Copy)]
pub struct PairVar {
    /// Index into the eligibility matrix's pair list.
    pub pair: usize,
    pub clinician: usize,
    pub instance: usize,
    pub var: BoolVar,
}

/// The assembled model for one shard.
pub struct BuiltModel {
    pub cp: CpModel,
    pub pair_vars: Vec<PairVar>,
    /// Head-count still open per instance after subtracting pins.
    pub required_free: Vec<u32>,
    /// Model-time observations (pin splits, rest conflicts between pins).
    pub notes: Vec<String>,
}

pub struct ModelBuilder<'a> {
    state: &'a StateSnapshot,
    instances: &'a [SlotInstance],
    matrix: &'a EligibilityMatrix,
    weights: Weights,
    allow_multiple_shifts_per_day: bool,
    only_fill_required: bool,
    range_start: NaiveDate,
    range_end: NaiveDate,
    working_days: u32,

    cp: CpModel,
    pair_vars: Vec<PairVar>,
    by_instance: Vec<SmallVec<[usize; 4]>>,
    by_clinician_day: BTreeMap<(usize, NaiveDate), SmallVec<[usize; 8]>>,
    manual_by_day: BTreeMap<(usize, NaiveDate), SmallVec<[usize; 2]>>,
    required_free: Vec<u32>,
    notes: Vec<String>,
}

impl<'a> ModelBuilder<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: &'a StateSnapshot,
        instances: &'a [SlotInstance],
        matrix: &'a EligibilityMatrix,
        params: &SolveParams,
        only_fill_required: bool,
        range_start: NaiveDate,
        range_end: NaiveDate,
        working_days: u32,
    ) -> Self {
        let required_free = instances
            .iter()
            .enumerate()
            .map(|(idx, instance)| {
                instance
                    .required
                    .saturating_sub(matrix.pinned_by_instance[idx])
            })
            .collect();

        let mut manual_by_day: BTreeMap<(usize, NaiveDate), SmallVec<[usize; 2]>> = BTreeMap::new();
        for (idx, shift) in matrix.manual.iter().enumerate() {
            if shift.row.is_some() {
                manual_by_day
                    .entry((shift.clinician, shift.date))
                    .or_default()
                    .push(idx);
            }
        }

        Self {
            state,
            instances,
            matrix,
            weights: params.weights,
            allow_multiple_shifts_per_day: params.allow_multiple_shifts_per_day,
            only_fill_required,
            range_start,
            range_end,
            working_days,
            cp: CpModel::new(),
            pair_vars: Vec::new(),
            by_instance: vec![SmallVec::new(); instances.len()],
            by_clinician_day: BTreeMap::new(),
            manual_by_day,
            required_free,
            notes: Vec::new(),
        }
    }

    pub fn build(mut self) -> BuiltModel {
        self.create_variables();

        self.post_capacity();
        self.post_no_overlap();
        self.post_single_shift_per_day();
        self.post_same_location();
        self.post_continuity();
        self.post_on_call_rest();

        self.add_coverage_objective();
        self.add_assignment_costs();
        self.add_location_spread();
        self.add_working_hours();

        debug!(
            vars = self.cp.var_count(),
            constraints = self.cp.constraint_count(),
            "shard model built"
        );

        BuiltModel {
            cp: self.cp,
            pair_vars: self.pair_vars,
            required_free: self.required_free,
            notes: self.notes,
        }
    }

    fn create_variables(&mut self) {
        for (pair_idx, pair) in self.matrix.pairs.iter().enumerate() {
            // Required coverage caps at zero remaining heads, so slots with
            // nothing open get no variables at all in only-fill mode.
            if self.only_fill_required && self.required_free[pair.instance] == 0 {
                continue;
            }
            let instance = &self.instances[pair.instance];
            let clinician = &self.state.clinicians[pair.clinician];
            let var = self.cp.new_bool_var(format!(
                "x_{}_{}_{}",
                clinician.id, instance.date, instance.row
            ));
            let pv_idx = self.pair_vars.len();
            self.pair_vars.push(PairVar {
                pair: pair_idx,
                clinician: pair.clinician,
                instance: pair.instance,
                var,
            });
            self.by_instance[pair.instance].push(pv_idx);
            self.by_clinician_day
                .entry((pair.clinician, instance.date))
                .or_default()
                .push(pv_idx);
        }
    }

    /// Clinician's manual class entries on one date.
    fn manual_on(&self, clinician: usize, date: NaiveDate) -> &[usize] {
        self.manual_by_day
            .get(&(clinician, date))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    fn on_call_class(&self) -> Option<&str> {
        self.state
            .solver_settings
            .on_call_rest_class_id
            .as_deref()
            .filter(|_| self.state.solver_settings.on_call_rest_enabled)
    }
}
