//! Time-based termination.

use std::time::Duration;

use super::{StopCause, Termination};
use crate::stats::SearchStats;

/// Terminates after a time limit.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use medrota_cp::termination::TimeTermination;
///
/// let term = TimeTermination::new(Duration::from_secs(4));
/// let term = TimeTermination::seconds(4);
/// let term = TimeTermination::millis(500);
/// ```
#[derive(Debug, Clone)]
pub struct TimeTermination {
    limit: Duration,
}

impl TimeTermination {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn seconds(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }
}

impl Termination for TimeTermination {
    fn check(&self, stats: &SearchStats) -> Option<StopCause> {
        (stats.elapsed() >= self.limit).then_some(StopCause::TimeLimit)
    }
}
