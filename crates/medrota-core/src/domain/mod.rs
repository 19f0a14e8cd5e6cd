//! Domain types consumed by the scheduling core.
//!
//! These mirror the wire schema of the state snapshot: field names keep
//! their JSON spelling through serde renames, dates are ISO `NaiveDate`s.

mod assignment;
mod clinician;
mod rows;
mod settings;
mod template;

pub use assignment::Assignment;
pub use clinician::{Clinician, TimeWindow, VacationRange, WindowKind};
pub use rows::{Holiday, Location, MinSlots, RowKind, SubShift, WorkplaceRow};
pub use settings::{SolverRule, SolverSettings, ThenType};
pub use template::{
    TemplateBlock, TemplateColBand, TemplateRowBand, TemplateSlot, WeeklyTemplate,
    WeeklyTemplateLocation,
};

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// The location every snapshot is guaranteed to contain.
pub const DEFAULT_LOCATION_ID: &str = "loc-default";
pub const DEFAULT_LOCATION_NAME: &str = "Main site";

/// Pool rows the optimizer understands.
pub const POOL_REST_DAY: &str = "pool-rest-day";
pub const POOL_VACATION: &str = "pool-vacation";

/// Pool rows dropped during normalization, together with their assignments.
pub const DEPRECATED_POOLS: [&str; 2] = ["pool-not-allocated", "pool-manual"];

/// Day category a template column band applies to.
///
/// A date marked as holiday shadows its weekday when projecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
    Holiday,
}

impl DayType {
    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayType::Mon,
            Weekday::Tue => DayType::Tue,
            Weekday::Wed => DayType::Wed,
            Weekday::Thu => DayType::Thu,
            Weekday::Fri => DayType::Fri,
            Weekday::Sat => DayType::Sat,
            Weekday::Sun => DayType::Sun,
        }
    }

    /// Weekend or holiday, the "weekend" bucket of `MinSlots`.
    pub fn is_weekend_or_holiday(self) -> bool {
        matches!(self, DayType::Sat | DayType::Sun | DayType::Holiday)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holiday_counts_as_weekend_bucket() {
        assert!(DayType::Holiday.is_weekend_or_holiday());
        assert!(DayType::Sat.is_weekend_or_holiday());
        assert!(!DayType::Wed.is_weekend_or_holiday());
    }

    #[test]
    fn day_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&DayType::Mon).unwrap(), "\"mon\"");
        assert_eq!(
            serde_json::from_str::<DayType>("\"holiday\"").unwrap(),
            DayType::Holiday
        );
    }
}
