//! Termination conditions for the search.

mod composite;
mod external;
mod time;

use crate::stats::SearchStats;

pub use composite::OrTermination;
pub use external::ExternalTermination;
pub use time::TimeTermination;

/// Why a search was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// The time budget ran out.
    TimeLimit,
    /// An external abort flag was raised.
    External,
}

/// Trait for deciding when to stop searching.
///
/// Checked cooperatively every few hundred nodes; implementations must be
/// cheap.
pub trait Termination: Send {
    fn check(&self, stats: &SearchStats) -> Option<StopCause>;
}

/// Never stops; the search runs to exhaustion.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTermination;

impl Termination for NoTermination {
    fn check(&self, _stats: &SearchStats) -> Option<StopCause> {
        None
    }
}
