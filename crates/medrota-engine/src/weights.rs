//! Objective weights.
//!
//! The coverage weight dominates every other term combined for realistic
//! instance sizes, so a missing head is never traded for comfort terms.
//! Below it: rest > location ~ hours-per-shift > preference > fill >
//! window.

use serde::{Deserialize, Serialize};

/// Integer weights of the soft objective terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Weights {
    /// Per missing head on a required slot instance.
    pub coverage: i64,
    /// Per on-call rest violation in the soft rest form.
    pub rest: i64,
    /// Per additional location a clinician touches on one day.
    pub location: i64,
    /// Per minute outside the working-hours tolerance band.
    pub hours_per_minute: i64,
    /// Per assignment outside the clinician's preferred sections.
    pub preference: i64,
    /// Per preference-list rank of a preferred assignment.
    pub preference_rank_step: i64,
    /// Reward per assignment in distribute-all mode.
    pub fill: i64,
    /// Per minute outside a preferred time window.
    pub window_per_minute: i64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            coverage: 10_000_000,
            rest: 10_000,
            location: 1_000,
            hours_per_minute: 2,
            preference: 100,
            preference_rank_step: 10,
            fill: 50,
            window_per_minute: 1,
        }
    }
}

impl Weights {
    /// Preference cost of one chosen assignment.
    ///
    /// A clinician without any preference list expressed no wish and is
    /// never charged.
    pub fn preference_cost(&self, rank: Option<usize>, has_preferences: bool) -> i64 {
        match rank {
            Some(rank) => self.preference_rank_step * rank as i64,
            None if has_preferences => self.preference,
            None => 0,
        }
    }
}
