//! Live-solution events for observers.
//!
//! The driver delivers every incumbent to a single observer, one at a
//! time. Observers must return quickly; long work there delays the
//! optimization. For slow consumers a bounded drop-oldest buffer is
//! provided.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::Serialize;

use medrota_core::domain::Assignment;

use crate::stats::ScheduleStats;

/// One improving solution, as shipped to observers.
///
/// `solution_num` is strictly increasing within a solve; the objective
/// never increases within a shard.
#[derive(Debug, Clone, Serialize)]
pub struct IncumbentEvent {
    pub solution_num: u64,
    pub time_ms: u64,
    pub objective: i64,
    pub assignments: Vec<Assignment>,
}

/// Observer verdict after each incumbent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverAction {
    Continue,
    /// Cancel the solve; the best incumbent so far is returned.
    Stop,
}

/// Receives live solutions during a solve.
pub trait SolveObserver: Send + Sync {
    fn on_incumbent(&self, event: &IncumbentEvent, stats: &ScheduleStats) -> ObserverAction;
}

/// Bounded drop-oldest buffer of incumbent events.
///
/// # Example
///
/// ```
/// use medrota_engine::events::EventBuffer;
///
/// let buffer = EventBuffer::with_capacity(8);
/// // pass &buffer as the observer, then drain after the solve
/// assert!(buffer.drain().is_empty());
/// ```
#[derive(Debug)]
pub struct EventBuffer {
    capacity: usize,
    events: Mutex<VecDeque<IncumbentEvent>>,
    dropped: Mutex<u64>,
}

impl EventBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            events: Mutex::new(VecDeque::new()),
            dropped: Mutex::new(0),
        }
    }

    /// Takes all buffered events in arrival order.
    pub fn drain(&self) -> Vec<IncumbentEvent> {
        self.events.lock().drain(..).collect()
    }

    /// Events discarded because the buffer was full.
    pub fn dropped(&self) -> u64 {
        *self.dropped.lock()
    }
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl SolveObserver for EventBuffer {
    fn on_incumbent(&self, event: &IncumbentEvent, _stats: &ScheduleStats) -> ObserverAction {
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
            *self.dropped.lock() += 1;
        }
        events.push_back(event.clone());
        ObserverAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(solution_num: u64) -> IncumbentEvent {
        IncumbentEvent {
            solution_num,
            time_ms: 0,
            objective: -(solution_num as i64),
            assignments: vec![],
        }
    }

    #[test]
    fn buffer_drops_oldest_when_full() {
        let buffer = EventBuffer::with_capacity(2);
        let stats = ScheduleStats::default();
        for n in 1..=3 {
            buffer.on_incumbent(&event(n), &stats);
        }
        let drained = buffer.drain();
        let numbers: Vec<u64> = drained.iter().map(|e| e.solution_num).collect();
        assert_eq!(numbers, vec![2, 3]);
        assert_eq!(buffer.dropped(), 1);
    }
}
