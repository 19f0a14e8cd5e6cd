//! Shared builders for tests across the workspace.

use std::collections::BTreeMap;

use crate::domain::{
    Clinician, DayType, Location, RowKind, SolverSettings, SubShift, TemplateBlock,
    TemplateColBand, TemplateRowBand, TemplateSlot, WeeklyTemplate, WeeklyTemplateLocation,
    WorkplaceRow, DEFAULT_LOCATION_ID, POOL_REST_DAY, POOL_VACATION,
};
use crate::state::StateSnapshot;

pub const ALL_DAY_TYPES: [DayType; 8] = [
    DayType::Mon,
    DayType::Tue,
    DayType::Wed,
    DayType::Thu,
    DayType::Fri,
    DayType::Sat,
    DayType::Sun,
    DayType::Holiday,
];

pub fn day_key(day_type: DayType) -> &'static str {
    match day_type {
        DayType::Mon => "mon",
        DayType::Tue => "tue",
        DayType::Wed => "wed",
        DayType::Thu => "thu",
        DayType::Fri => "fri",
        DayType::Sat => "sat",
        DayType::Sun => "sun",
        DayType::Holiday => "holiday",
    }
}

pub fn make_class_row(id: &str) -> WorkplaceRow {
    WorkplaceRow {
        id: id.to_string(),
        name: id.to_string(),
        kind: RowKind::Class,
        dot_color_class: "bg-slate-400".to_string(),
        block_color: None,
        location_id: Some(DEFAULT_LOCATION_ID.to_string()),
        sub_shifts: vec![SubShift {
            id: "s1".to_string(),
            name: "Shift 1".to_string(),
            order: 1,
            start_time: Some("08:00".to_string()),
            end_time: Some("16:00".to_string()),
            end_day_offset: Some(0),
            hours: None,
        }],
    }
}

pub fn make_pool_row(id: &str, name: &str) -> WorkplaceRow {
    WorkplaceRow {
        id: id.to_string(),
        name: name.to_string(),
        kind: RowKind::Pool,
        dot_color_class: "bg-slate-200".to_string(),
        block_color: None,
        location_id: None,
        sub_shifts: vec![],
    }
}

pub fn make_clinician(id: &str, qualified: &[&str]) -> Clinician {
    Clinician {
        id: id.to_string(),
        name: format!("Dr. {id}"),
        qualified_class_ids: qualified.iter().map(|s| s.to_string()).collect(),
        preferred_class_ids: vec![],
        vacations: vec![],
        working_hours_per_week: None,
        working_hours_tolerance_hours: None,
        time_windows: vec![],
    }
}

pub fn all_day_col_bands() -> Vec<TemplateColBand> {
    ALL_DAY_TYPES
        .iter()
        .map(|day_type| TemplateColBand {
            id: format!("col-{}-1", day_key(*day_type)),
            label: String::new(),
            order: 1,
            day_type: *day_type,
        })
        .collect()
}

/// One section, one clinician, one required Monday slot.
pub fn state_with_single_slot(
    section: &str,
    required: u32,
    start_time: &str,
    end_time: &str,
) -> StateSnapshot {
    let mut state = StateSnapshot {
        locations: vec![Location {
            id: DEFAULT_LOCATION_ID.to_string(),
            name: "Berlin".to_string(),
        }],
        locations_enabled: true,
        rows: vec![
            make_class_row(section),
            make_pool_row(POOL_REST_DAY, "Rest Day"),
            make_pool_row(POOL_VACATION, "Vacation"),
        ],
        clinicians: vec![make_clinician("clin-1", &[section])],
        assignments: vec![],
        min_slots_by_row_id: BTreeMap::new(),
        slot_overrides_by_key: BTreeMap::new(),
        weekly_template: WeeklyTemplate {
            version: 4,
            blocks: vec![],
            locations: vec![WeeklyTemplateLocation {
                location_id: DEFAULT_LOCATION_ID.to_string(),
                row_bands: vec![TemplateRowBand {
                    id: "row-1".to_string(),
                    label: "Row 1".to_string(),
                    order: 1,
                }],
                col_bands: all_day_col_bands(),
                slots: vec![],
            }],
        },
        holidays: vec![],
        solver_settings: SolverSettings::default(),
        solver_rules: vec![],
    };
    add_slot(
        &mut state,
        "slot-a__mon",
        section,
        DayType::Mon,
        required,
        start_time,
        end_time,
    );
    state
}

/// Adds a block (if missing) and a slot for the given section and day type.
pub fn add_slot(
    state: &mut StateSnapshot,
    slot_id: &str,
    section: &str,
    day_type: DayType,
    required: u32,
    start_time: &str,
    end_time: &str,
) {
    add_slot_at(
        state,
        slot_id,
        section,
        day_type,
        required,
        start_time,
        end_time,
        DEFAULT_LOCATION_ID,
    );
}

/// `add_slot` with an explicit location.
#[allow(clippy::too_many_arguments)]
pub fn add_slot_at(
    state: &mut StateSnapshot,
    slot_id: &str,
    section: &str,
    day_type: DayType,
    required: u32,
    start_time: &str,
    end_time: &str,
    location_id: &str,
) {
    let block_id = format!("block-{section}");
    if state.weekly_template.block(&block_id).is_none() {
        state.weekly_template.blocks.push(TemplateBlock {
            id: block_id.clone(),
            section_id: section.to_string(),
            required_slots: 0,
        });
    }
    let template_loc = &mut state.weekly_template.locations[0];
    template_loc.slots.push(TemplateSlot {
        id: slot_id.to_string(),
        location_id: location_id.to_string(),
        row_band_id: "row-1".to_string(),
        col_band_id: format!("col-{}-1", day_key(day_type)),
        block_id,
        required_slots: required,
        start_time: start_time.to_string(),
        end_time: end_time.to_string(),
        end_day_offset: 0,
    });
}

/// Registers an extra location.
pub fn add_location(state: &mut StateSnapshot, id: &str, name: &str) {
    if !state.locations.iter().any(|l| l.id == id) {
        state.locations.push(Location {
            id: id.to_string(),
            name: name.to_string(),
        });
    }
}

/// Adds a class row and matching block so slots can reference the section.
pub fn add_section(state: &mut StateSnapshot, section: &str) {
    if state.row(section).is_none() {
        state.rows.push(make_class_row(section));
    }
}
