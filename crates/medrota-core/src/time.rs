//! Minute-level time handling for shift slots.
//!
//! All shift arithmetic happens on minutes since midnight. A slot that
//! crosses midnight is represented by an end beyond 1440; absolute spans
//! place a day's minutes on a single timeline so overnight shifts collide
//! with the following day's slots.

use crate::error::{Result, RosterError};

/// Minutes in one day.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Parses `HH:MM` into minutes since midnight.
///
/// Accepts one or two hour digits and exactly two minute digits,
/// `00:00` through `23:59`.
///
/// # Example
///
/// ```
/// use medrota_core::time::parse_hhmm;
///
/// assert_eq!(parse_hhmm("08:00").unwrap(), 480);
/// assert_eq!(parse_hhmm("7:30").unwrap(), 450);
/// assert!(parse_hhmm("24:00").is_err());
/// assert!(parse_hhmm("8h00").is_err());
/// ```
pub fn parse_hhmm(value: &str) -> Result<u32> {
    let trimmed = value.trim();
    let err = || RosterError::TimeParse(value.to_string());
    let (h, m) = trimmed.split_once(':').ok_or_else(err)?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return Err(err());
    }
    if !h.bytes().all(|b| b.is_ascii_digit()) || !m.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }
    let hours: u32 = h.parse().map_err(|_| err())?;
    let minutes: u32 = m.parse().map_err(|_| err())?;
    if hours > 23 || minutes > 59 {
        return Err(err());
    }
    Ok(hours * 60 + minutes)
}

/// Formats minutes since midnight as `HH:MM`, wrapping at midnight.
pub fn format_hhmm(total_minutes: i64) -> String {
    let clamped = total_minutes.rem_euclid(MINUTES_PER_DAY);
    format!("{:02}:{:02}", clamped / 60, clamped % 60)
}

/// A half-open interval `[start, end)` in minutes.
///
/// Local spans are minutes within a day (end may exceed 1440 for
/// overnight shifts); absolute spans are offset by a day index onto the
/// range timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MinuteSpan {
    pub start: i64,
    pub end: i64,
}

impl MinuteSpan {
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Builds a local span from wall-clock minutes and a day offset.
    ///
    /// With `end_day_offset = 0` an end before the start is treated as
    /// next-day; equal start and end yields a zero-length span.
    pub fn from_local(start_min: u32, end_min: u32, end_day_offset: u32) -> Self {
        let start = i64::from(start_min);
        let mut end = i64::from(end_min) + i64::from(end_day_offset) * MINUTES_PER_DAY;
        if end_day_offset == 0 && end < start {
            end += MINUTES_PER_DAY;
        }
        Self { start, end }
    }

    /// Shifts this span by a number of days onto the absolute timeline.
    pub fn offset_by_days(self, day_index: i64) -> Self {
        let delta = day_index * MINUTES_PER_DAY;
        Self::new(self.start + delta, self.end + delta)
    }

    pub fn duration_minutes(self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.end <= self.start
    }

    /// True when the spans share at least one minute; touching spans do
    /// not overlap.
    pub fn overlaps(self, other: MinuteSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Strictly positive gap from the end of `self` to the start of
    /// `other`, or zero when they touch or overlap.
    pub fn gap_to(self, other: MinuteSpan) -> i64 {
        (other.start - self.end).max(0)
    }
}
