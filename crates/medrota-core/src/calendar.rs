//! Calendar projection: maps the weekly template onto concrete dates.
//!
//! A `SlotInstance` is one template slot on one date, carrying its local
//! and absolute minute spans and the effective required head-count after
//! per-day overrides.

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::domain::{DayType, WorkplaceRow};
use crate::ids::{RowId, SlotKey};
use crate::state::StateSnapshot;
use crate::time::{parse_hhmm, MinuteSpan};

/// A template slot projected onto a concrete date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotInstance {
    pub slot_id: String,
    pub row: RowId,
    pub location_id: String,
    pub date: NaiveDate,
    /// Days from the range start; manual context may sit before it.
    pub day_index: i64,
    pub day_type: DayType,
    /// Minutes within the day (end past 1440 for overnight slots).
    pub local: MinuteSpan,
    /// Minutes on the range timeline.
    pub span: MinuteSpan,
    /// Head-count after applying the per-day override.
    pub required: u32,
}

impl SlotInstance {
    /// Wire key of the (row, date) bucket this instance belongs to.
    pub fn bucket_key(&self) -> SlotKey {
        SlotKey::new(self.row.clone(), self.date)
    }
}

#[derive(Debug, Clone)]
struct PreparedSlot {
    slot_id: String,
    row: RowId,
    location_id: String,
    day_type: DayType,
    local: MinuteSpan,
    base_required: u32,
}

/// Projects the weekly template of a snapshot onto a date range.
///
/// The projection is lazy and restartable: `iter()` walks
/// `(date, location, row band, col band, sub-shift, start)` order and can
/// be called any number of times.
pub struct CalendarProjector<'a> {
    state: &'a StateSnapshot,
    start: NaiveDate,
    end: NaiveDate,
    prepared: Vec<PreparedSlot>,
}

impl<'a> CalendarProjector<'a> {
    pub fn new(state: &'a StateSnapshot, start: NaiveDate, end: NaiveDate) -> Self {
        let mut prepared = Vec::new();
        let mut keyed: Vec<((String, u32, u32, u8, i64), PreparedSlot)> = Vec::new();

        for template_loc in &state.weekly_template.locations {
            for slot in &template_loc.slots {
                let Some(col_band) = template_loc.col_bands.iter().find(|b| b.id == slot.col_band_id)
                else {
                    continue;
                };
                let Some(row_band) = template_loc.row_bands.iter().find(|b| b.id == slot.row_band_id)
                else {
                    continue;
                };
                let Some(section_id) = state
                    .weekly_template
                    .block(&slot.block_id)
                    .map(|b| b.section_id.clone())
                else {
                    continue;
                };
                let Some(section) = state.row(&section_id).filter(|r| r.is_class()) else {
                    continue;
                };
                let (Ok(start_min), Ok(end_min)) =
                    (parse_hhmm(&slot.start_time), parse_hhmm(&slot.end_time))
                else {
                    debug!(slot = %slot.id, "skipping template slot with unparsable time");
                    continue;
                };
                let local = MinuteSpan::from_local(start_min, end_min, slot.end_day_offset);
                let subshift_id = pick_subshift(section, &slot.start_time);
                let row = RowId::new(&section_id, subshift_id);
                let subshift_order = section
                    .sub_shift(row.subshift_id())
                    .map(|s| s.order)
                    .unwrap_or(1);

                let key = (
                    slot.location_id.clone(),
                    row_band.order,
                    col_band.order,
                    subshift_order,
                    local.start,
                );
                keyed.push((
                    key,
                    PreparedSlot {
                        slot_id: slot.id.clone(),
                        row,
                        location_id: slot.location_id.clone(),
                        day_type: col_band.day_type,
                        local,
                        base_required: slot.required_slots,
                    },
                ));
            }
        }

        keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
        prepared.extend(keyed.into_iter().map(|(_, slot)| slot));

        Self { state, start, end, prepared }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Day category of a date: a holiday shadows its weekday.
    pub fn day_type(&self, date: NaiveDate) -> DayType {
        if self.state.is_holiday(date) {
            DayType::Holiday
        } else {
            DayType::from_weekday(date.weekday())
        }
    }

    /// Days from the range start (negative before it).
    pub fn day_index(&self, date: NaiveDate) -> i64 {
        date.signed_duration_since(self.start).num_days()
    }

    /// Mon-Fri non-holiday dates in the range; the working-hours scale is
    /// `working_days / 5`.
    pub fn working_days(&self) -> u32 {
        self.start
            .iter_days()
            .take_while(|d| *d <= self.end)
            .filter(|d| !self.day_type(*d).is_weekend_or_holiday())
            .count() as u32
    }

    pub fn iter(&self) -> SlotInstances<'_, 'a> {
        SlotInstances {
            projector: self,
            date: Some(self.start),
            cursor: 0,
        }
    }

    /// Collects the full projection.
    pub fn instances(&self) -> Vec<SlotInstance> {
        self.iter().collect()
    }

    fn instantiate(&self, prepared: &PreparedSlot, date: NaiveDate, day_type: DayType) -> SlotInstance {
        let day_index = self.day_index(date);
        let key = SlotKey::new(prepared.row.clone(), date).to_string();
        let required = match self.state.slot_overrides_by_key.get(&key) {
            Some(v) if *v <= 0 => 0,
            Some(v) => prepared.base_required.max(*v as u32),
            None => prepared.base_required,
        };
        SlotInstance {
            slot_id: prepared.slot_id.clone(),
            row: prepared.row.clone(),
            location_id: prepared.location_id.clone(),
            date,
            day_index,
            day_type,
            local: prepared.local,
            span: prepared.local.offset_by_days(day_index),
            required,
        }
    }
}

fn pick_subshift<'r>(section: &'r WorkplaceRow, start_time: &str) -> &'r str {
    section
        .sub_shifts
        .iter()
        .find(|s| s.start_time.as_deref() == Some(start_time))
        .or_else(|| section.sub_shifts.first())
        .map(|s| s.id.as_str())
        .unwrap_or(crate::ids::DEFAULT_SUBSHIFT_ID)
}

/// Lazy walk over the projected slot instances.
pub struct SlotInstances<'p, 'a> {
    projector: &'p CalendarProjector<'a>,
    date: Option<NaiveDate>,
    cursor: usize,
}

impl<'p, 'a> Iterator for SlotInstances<'p, 'a> {
    type Item = SlotInstance;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let date = self.date?;
            if date > self.projector.end {
                self.date = None;
                return None;
            }
            let day_type = self.projector.day_type(date);
            while self.cursor < self.projector.prepared.len() {
                let prepared = &self.projector.prepared[self.cursor];
                self.cursor += 1;
                if prepared.day_type == day_type {
                    return Some(self.projector.instantiate(prepared, date, day_type));
                }
            }
            self.date = date.succ_opt();
            self.cursor = 0;
        }
    }
}
