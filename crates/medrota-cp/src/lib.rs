//! medrota-cp - Boolean CP backend
//!
//! A small, deterministic constraint backend: boolean variables, two-sided
//! linear constraints and a minimized integer objective, solved by
//! depth-first branch-and-bound with activity propagation. Improving
//! solutions stream out through a callback; termination is cooperative
//! (time budget or external abort flag).

pub mod model;
pub mod search;
pub mod stats;
pub mod termination;

pub use model::{BoolVar, CpModel, LinearConstraint, NO_LOWER, NO_UPPER};
pub use search::{BranchAndBound, Incumbent, SearchControl, SearchOutcome, SolveStatus};
pub use stats::SearchStats;
pub use termination::{
    ExternalTermination, NoTermination, OrTermination, StopCause, Termination, TimeTermination,
};
