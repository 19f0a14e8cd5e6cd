//! Search statistics.
//!
//! Stack-allocated counters for one branch-and-bound run.

use std::time::{Duration, Instant};

/// Counters and timing for a single search.
///
/// # Example
///
/// ```
/// use medrota_cp::stats::SearchStats;
///
/// let mut stats = SearchStats::default();
/// stats.start();
/// stats.record_node();
/// stats.record_incumbent();
///
/// assert_eq!(stats.nodes, 1);
/// assert_eq!(stats.incumbents, 1);
/// ```
#[derive(Debug, Default)]
pub struct SearchStats {
    start_time: Option<Instant>,
    /// Decisions taken (including re-tries of the second branch).
    pub nodes: u64,
    /// Dead ends hit during search.
    pub conflicts: u64,
    /// Improving solutions found.
    pub incumbents: u64,
}

impl SearchStats {
    /// Marks the start of the search.
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Elapsed time since the search started.
    pub fn elapsed(&self) -> Duration {
        self.start_time.map(|t| t.elapsed()).unwrap_or_default()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    pub fn record_node(&mut self) {
        self.nodes += 1;
    }

    pub fn record_conflict(&mut self) {
        self.conflicts += 1;
    }

    pub fn record_incumbent(&mut self) {
        self.incumbents += 1;
    }

    /// Nodes explored per second.
    pub fn nodes_per_second(&self) -> u64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            (self.nodes as f64 / secs) as u64
        } else {
            0
        }
    }
}
