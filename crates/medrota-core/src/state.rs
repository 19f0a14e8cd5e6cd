//! State snapshot schema and normalization.
//!
//! Normalization is a pure function: it takes the raw snapshot the
//! configuration layer stored and returns a cleaned snapshot plus the list
//! of warnings describing what was repaired. The solve pipeline only ever
//! sees normalized state.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{
    Assignment, Clinician, Holiday, Location, MinSlots, RowKind, SolverRule, SolverSettings,
    SubShift, WeeklyTemplate, WorkplaceRow, DEFAULT_LOCATION_ID, DEFAULT_LOCATION_NAME,
    DEPRECATED_POOLS,
};
use crate::ids::{RowId, SlotKey, DEFAULT_SUBSHIFT_ID, ROW_ID_SEPARATOR};
use crate::time::{format_hhmm, parse_hhmm};

const DEFAULT_SUB_SHIFT_START_MINUTES: i64 = 8 * 60;
const DEFAULT_SUB_SHIFT_MINUTES: i64 = 8 * 60;

/// Solver settings stored keys that no longer do anything.
const DEPRECATED_SETTINGS: [&str; 3] = [
    "allowMultipleShiftsPerDay",
    "showDistributionPool",
    "showReservePool",
];

fn default_true() -> bool {
    true
}

/// Everything the scheduling core consumes, as stored per user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(rename = "locationsEnabled", default = "default_true")]
    pub locations_enabled: bool,
    #[serde(default)]
    pub rows: Vec<WorkplaceRow>,
    #[serde(default)]
    pub clinicians: Vec<Clinician>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(rename = "minSlotsByRowId", default)]
    pub min_slots_by_row_id: BTreeMap<String, MinSlots>,
    #[serde(rename = "slotOverridesByKey", default)]
    pub slot_overrides_by_key: BTreeMap<String, i64>,
    #[serde(rename = "weeklyTemplate", default)]
    pub weekly_template: WeeklyTemplate,
    #[serde(default)]
    pub holidays: Vec<Holiday>,
    #[serde(rename = "solverSettings", default)]
    pub solver_settings: SolverSettings,
    #[serde(rename = "solverRules", default)]
    pub solver_rules: Vec<SolverRule>,
}

impl StateSnapshot {
    pub fn class_rows(&self) -> impl Iterator<Item = &WorkplaceRow> {
        self.rows.iter().filter(|r| r.is_class())
    }

    pub fn row(&self, row_id: &str) -> Option<&WorkplaceRow> {
        self.rows.iter().find(|r| r.id == row_id)
    }

    pub fn clinician_index(&self, clinician_id: &str) -> Option<usize> {
        self.clinicians.iter().position(|c| c.id == clinician_id)
    }

    pub fn is_holiday(&self, date: chrono::NaiveDate) -> bool {
        self.holidays.iter().any(|h| h.date == date)
    }
}

/// Normalizes a raw snapshot, returning the cleaned state and warnings.
pub fn normalize(mut state: StateSnapshot) -> (StateSnapshot, Vec<String>) {
    let mut warnings = Vec::new();

    normalize_locations(&mut state);
    normalize_rows(&mut state, &mut warnings);
    normalize_clinicians(&mut state, &mut warnings);
    normalize_assignments(&mut state, &mut warnings);
    normalize_min_slots(&mut state, &mut warnings);
    normalize_overrides(&mut state, &mut warnings);
    normalize_settings(&mut state, &mut warnings);
    normalize_rules(&mut state);
    normalize_template(&mut state, &mut warnings);

    if !warnings.is_empty() {
        debug!(count = warnings.len(), "state normalization produced warnings");
    }
    (state, warnings)
}

fn normalize_locations(state: &mut StateSnapshot) {
    let mut seen = BTreeSet::new();
    state.locations.retain(|loc| !loc.id.is_empty() && seen.insert(loc.id.clone()));
    if !seen.contains(DEFAULT_LOCATION_ID) {
        state.locations.push(Location {
            id: DEFAULT_LOCATION_ID.to_string(),
            name: DEFAULT_LOCATION_NAME.to_string(),
        });
    }
}

fn normalize_sub_shifts(row_id: &str, shifts: &[SubShift], warnings: &mut Vec<String>) -> Vec<SubShift> {
    let mut used_orders: BTreeSet<u8> = BTreeSet::new();
    let mut normalized = Vec::new();

    for shift in shifts {
        let order = if (1..=3).contains(&shift.order) && !used_orders.contains(&shift.order) {
            shift.order
        } else {
            match (1..=3).find(|o| !used_orders.contains(o)) {
                Some(o) => o,
                None => continue,
            }
        };
        used_orders.insert(order);

        let id = if shift.id.is_empty() {
            format!("s{order}")
        } else {
            shift.id.clone()
        };
        let name = if shift.name.is_empty() {
            format!("Shift {order}")
        } else {
            shift.name.clone()
        };

        let mut parse_opt = |value: &Option<String>, what: &str| -> Option<i64> {
            let raw = value.as_deref()?;
            match parse_hhmm(raw) {
                Ok(min) => Some(i64::from(min)),
                Err(_) => {
                    warnings.push(format!(
                        "Invalid {what} `{raw}` on sub-shift {row_id}{ROW_ID_SEPARATOR}{id}; using default"
                    ));
                    None
                }
            }
        };
        let start_minutes = parse_opt(&shift.start_time, "start time").unwrap_or(
            DEFAULT_SUB_SHIFT_START_MINUTES + DEFAULT_SUB_SHIFT_MINUTES * i64::from(order - 1),
        );
        let duration = shift
            .hours
            .map(|h| (h.max(0.0) * 60.0) as i64)
            .unwrap_or(DEFAULT_SUB_SHIFT_MINUTES);
        let end_minutes = parse_opt(&shift.end_time, "end time").unwrap_or(start_minutes + duration);
        let end_day_offset = shift.end_day_offset.unwrap_or(0).clamp(0, 3);

        normalized.push(SubShift {
            id,
            name,
            order,
            start_time: Some(format_hhmm(start_minutes)),
            end_time: Some(format_hhmm(end_minutes)),
            end_day_offset: Some(end_day_offset),
            hours: None,
        });
    }

    if normalized.is_empty() {
        normalized.push(SubShift {
            id: DEFAULT_SUBSHIFT_ID.to_string(),
            name: "Shift 1".to_string(),
            order: 1,
            start_time: Some(format_hhmm(DEFAULT_SUB_SHIFT_START_MINUTES)),
            end_time: Some(format_hhmm(
                DEFAULT_SUB_SHIFT_START_MINUTES + DEFAULT_SUB_SHIFT_MINUTES,
            )),
            end_day_offset: Some(0),
            hours: None,
        });
    }

    normalized.sort_by_key(|s| s.order);
    normalized.truncate(3);
    normalized
}

fn normalize_rows(state: &mut StateSnapshot, warnings: &mut Vec<String>) {
    let before = state.rows.len();
    state
        .rows
        .retain(|row| !(row.kind == RowKind::Pool && DEPRECATED_POOLS.contains(&row.id.as_str())));
    if state.rows.len() != before {
        warnings.push("Dropped deprecated pool rows".to_string());
    }

    let location_ids: BTreeSet<String> = state.locations.iter().map(|l| l.id.clone()).collect();
    let locations_enabled = state.locations_enabled;
    for row in &mut state.rows {
        if !row.is_class() {
            continue;
        }
        row.sub_shifts = normalize_sub_shifts(&row.id, &row.sub_shifts, warnings);
        let location_known = row
            .location_id
            .as_deref()
            .is_some_and(|id| location_ids.contains(id));
        if !location_known || (!locations_enabled && row.location_id.as_deref() != Some(DEFAULT_LOCATION_ID)) {
            row.location_id = Some(DEFAULT_LOCATION_ID.to_string());
        }
    }
}

fn normalize_clinicians(state: &mut StateSnapshot, warnings: &mut Vec<String>) {
    for clinician in &mut state.clinicians {
        let qualified: BTreeSet<&String> = clinician.qualified_class_ids.iter().collect();
        let dropped: Vec<String> = clinician
            .preferred_class_ids
            .iter()
            .filter(|p| !qualified.contains(p))
            .cloned()
            .collect();
        for class_id in &dropped {
            warnings.push(format!(
                "Removed preferred section `{class_id}` from {}: not qualified",
                clinician.id
            ));
        }
        clinician
            .preferred_class_ids
            .retain(|p| !dropped.contains(p));

        let invalid: Vec<String> = clinician
            .vacations
            .iter()
            .filter(|v| v.start > v.end)
            .map(|v| v.id.clone())
            .collect();
        for id in &invalid {
            warnings.push(format!(
                "Dropped vacation `{id}` of {}: start after end",
                clinician.id
            ));
        }
        clinician.vacations.retain(|v| v.start <= v.end);
        clinician.vacations.sort_by_key(|v| v.start);
    }
}

fn normalize_assignments(state: &mut StateSnapshot, warnings: &mut Vec<String>) {
    let class_rows: Vec<&WorkplaceRow> = state.rows.iter().filter(|r| r.is_class()).collect();
    let class_row_ids: BTreeSet<String> = class_rows.iter().map(|r| r.id.clone()).collect();
    let sub_ids_by_class: BTreeMap<String, BTreeSet<String>> = class_rows
        .iter()
        .map(|r| (r.id.clone(), r.sub_shifts.iter().map(|s| s.id.clone()).collect()))
        .collect();
    let fallback_sub_by_class: BTreeMap<String, String> = class_rows
        .iter()
        .map(|r| {
            let first = r
                .sub_shifts
                .first()
                .map(|s| s.id.clone())
                .unwrap_or_else(|| DEFAULT_SUBSHIFT_ID.to_string());
            (r.id.clone(), first)
        })
        .collect();
    let all_row_ids: BTreeSet<String> = state.rows.iter().map(|r| r.id.clone()).collect();
    let clinician_ids: BTreeSet<String> = state.clinicians.iter().map(|c| c.id.clone()).collect();

    let mut next = Vec::with_capacity(state.assignments.len());
    for assignment in state.assignments.drain(..) {
        let mut assignment = assignment;

        if !clinician_ids.contains(&assignment.clinician_id) {
            warnings.push(format!(
                "Dropped assignment {}: unknown clinician `{}`",
                assignment.id, assignment.clinician_id
            ));
            continue;
        }
        if DEPRECATED_POOLS.contains(&assignment.row_id.as_str()) {
            warnings.push(format!(
                "Dropped assignment {}: deprecated pool `{}`",
                assignment.id, assignment.row_id
            ));
            continue;
        }

        if class_row_ids.contains(&assignment.row_id) && RowId::is_legacy(&assignment.row_id) {
            let fallback = &fallback_sub_by_class[&assignment.row_id];
            assignment.row_id = RowId::new(&assignment.row_id, fallback).to_string();
        }

        if !RowId::is_legacy(&assignment.row_id) {
            let row = RowId::parse(&assignment.row_id);
            match sub_ids_by_class.get(row.class_id()) {
                Some(subs) => {
                    if !subs.contains(row.subshift_id()) {
                        let fallback = &fallback_sub_by_class[row.class_id()];
                        warnings.push(format!(
                            "Remapped assignment {} to {}{}{}: unknown sub-shift",
                            assignment.id,
                            row.class_id(),
                            ROW_ID_SEPARATOR,
                            fallback
                        ));
                        assignment.row_id = RowId::new(row.class_id(), fallback).to_string();
                    }
                    next.push(assignment);
                }
                None => {
                    warnings.push(format!(
                        "Dropped assignment {}: unknown section `{}`",
                        assignment.id,
                        row.class_id()
                    ));
                }
            }
            continue;
        }

        // Legacy id that is not a class row: pools and other known rows pass.
        if assignment.row_id.starts_with("pool-") || all_row_ids.contains(&assignment.row_id) {
            next.push(assignment);
        } else {
            warnings.push(format!(
                "Dropped assignment {}: unknown row `{}`",
                assignment.id, assignment.row_id
            ));
        }
    }
    state.assignments = next;
}

fn normalize_min_slots(state: &mut StateSnapshot, warnings: &mut Vec<String>) {
    let class_rows: Vec<(String, Vec<String>)> = state
        .class_rows()
        .map(|r| (r.id.clone(), r.sub_shifts.iter().map(|s| s.id.clone()).collect()))
        .collect();
    let mut min_slots = std::mem::take(&mut state.min_slots_by_row_id);

    for (class_id, sub_ids) in &class_rows {
        let base = min_slots.remove(class_id);
        if base.is_some() {
            warnings.push(format!("Migrated legacy required-slot counts for `{class_id}`"));
        }
        for sub_id in sub_ids {
            let key = RowId::new(class_id, sub_id).to_string();
            min_slots.entry(key).or_insert_with(|| {
                if sub_id == DEFAULT_SUBSHIFT_ID {
                    base.unwrap_or_default()
                } else {
                    MinSlots::default()
                }
            });
        }
    }

    min_slots.retain(|key, _| {
        let row = RowId::parse(key);
        class_rows
            .iter()
            .find(|(class_id, _)| class_id == row.class_id())
            .is_some_and(|(_, subs)| subs.iter().any(|s| s == row.subshift_id()))
    });
    state.min_slots_by_row_id = min_slots;
}

fn normalize_overrides(state: &mut StateSnapshot, warnings: &mut Vec<String>) {
    let sub_ids_by_class: BTreeMap<String, Vec<String>> = state
        .class_rows()
        .map(|r| (r.id.clone(), r.sub_shifts.iter().map(|s| s.id.clone()).collect()))
        .collect();

    let overrides = std::mem::take(&mut state.slot_overrides_by_key);
    let mut next: BTreeMap<String, i64> = BTreeMap::new();
    for (key, value) in overrides {
        let Some(slot_key) = SlotKey::parse(&key) else {
            warnings.push(format!("Dropped malformed slot override key `{key}`"));
            continue;
        };
        let row = slot_key.row;
        let Some(subs) = sub_ids_by_class.get(row.class_id()) else {
            warnings.push(format!("Dropped slot override `{key}`: unknown section"));
            continue;
        };
        let row = if subs.iter().any(|s| s == row.subshift_id()) {
            row
        } else {
            let Some(fallback) = subs.first() else {
                warnings.push(format!("Dropped slot override `{key}`: section has no sub-shifts"));
                continue;
            };
            RowId::new(row.class_id(), fallback)
        };
        let next_key = SlotKey::new(row, slot_key.date).to_string();
        *next.entry(next_key).or_insert(0) += value;
    }
    state.slot_overrides_by_key = next;
}

fn normalize_settings(state: &mut StateSnapshot, warnings: &mut Vec<String>) {
    let settings = &mut state.solver_settings;

    for key in DEPRECATED_SETTINGS {
        if settings.unknown.remove(key).is_some() {
            warnings.push(format!("Discarded deprecated solver setting `{key}`"));
        }
    }
    settings.unknown.clear();

    settings.on_call_rest_days_before = settings.on_call_rest_days_before.clamp(0, 7);
    settings.on_call_rest_days_after = settings.on_call_rest_days_after.clamp(0, 7);
    if settings.working_hours_tolerance_hours < 0.0 {
        warnings.push("Negative working-hours tolerance reset to default".to_string());
        settings.working_hours_tolerance_hours = 5.0;
    }

    let class_row_ids: Vec<&String> = state
        .rows
        .iter()
        .filter(|r| r.is_class())
        .map(|r| &r.id)
        .collect();
    let valid = settings
        .on_call_rest_class_id
        .as_ref()
        .is_some_and(|id| class_row_ids.iter().any(|c| *c == id));
    if !valid {
        settings.on_call_rest_class_id = class_row_ids.first().map(|id| (*id).clone());
    }
}

fn normalize_rules(state: &mut StateSnapshot) {
    let valid_shift_row_ids: BTreeSet<String> = state
        .class_rows()
        .flat_map(|row| {
            row.sub_shifts
                .iter()
                .map(|s| RowId::new(&row.id, &s.id).to_string())
                .collect::<Vec<_>>()
        })
        .collect();

    for rule in &mut state.solver_rules {
        if !valid_shift_row_ids.contains(&rule.if_shift_row_id) {
            rule.enabled = false;
        }
        if rule.then_type == crate::domain::ThenType::ShiftRow {
            let known = rule
                .then_shift_row_id
                .as_ref()
                .is_some_and(|id| valid_shift_row_ids.contains(id));
            if !known {
                rule.enabled = false;
            }
        }
    }
}

fn normalize_template(state: &mut StateSnapshot, warnings: &mut Vec<String>) {
    let class_row_ids: BTreeSet<String> =
        state.class_rows().map(|r| r.id.clone()).collect();
    let location_ids: BTreeSet<String> = state.locations.iter().map(|l| l.id.clone()).collect();
    let section_by_block: BTreeMap<String, String> = state
        .weekly_template
        .blocks
        .iter()
        .map(|b| (b.id.clone(), b.section_id.clone()))
        .collect();

    for template_loc in &mut state.weekly_template.locations {
        if !location_ids.contains(&template_loc.location_id) {
            template_loc.location_id = DEFAULT_LOCATION_ID.to_string();
        }
        let row_band_ids: BTreeSet<&String> = template_loc.row_bands.iter().map(|b| &b.id).collect();
        let col_band_ids: BTreeSet<&String> = template_loc.col_bands.iter().map(|b| &b.id).collect();

        let mut kept = Vec::with_capacity(template_loc.slots.len());
        for mut slot in template_loc.slots.drain(..) {
            if !col_band_ids.contains(&slot.col_band_id) || !row_band_ids.contains(&slot.row_band_id)
            {
                warnings.push(format!("Dropped template slot `{}`: unknown band", slot.id));
                continue;
            }
            let section_known = section_by_block
                .get(&slot.block_id)
                .is_some_and(|section| class_row_ids.contains(section));
            if !section_known {
                warnings.push(format!(
                    "Dropped template slot `{}`: no section behind block `{}`",
                    slot.id, slot.block_id
                ));
                continue;
            }
            if parse_hhmm(&slot.start_time).is_err() || parse_hhmm(&slot.end_time).is_err() {
                warnings.push(format!(
                    "Excluded template slot `{}`: malformed time `{}`-`{}`",
                    slot.id, slot.start_time, slot.end_time
                ));
                continue;
            }
            if slot.end_day_offset > 1 {
                warnings.push(format!(
                    "Clamped end day offset of template slot `{}`",
                    slot.id
                ));
                slot.end_day_offset = 1;
            }
            if !location_ids.contains(&slot.location_id) {
                slot.location_id = DEFAULT_LOCATION_ID.to_string();
            }
            kept.push(slot);
        }
        template_loc.slots = kept;
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
