//! medrota - Constraint-based shift scheduling for clinical departments
//!
//! Given a weekly slot template, a roster of clinicians with
//! qualifications and absences, and pinned manual assignments, medrota
//! produces a feasible schedule over a requested date range: required
//! coverage first, then continuity, same-location days, on-call rest and
//! working-hours balance.
//!
//! # Quick start
//!
//! ```no_run
//! use medrota::prelude::*;
//!
//! # fn run(snapshot: medrota::StateSnapshot) -> medrota::Result<()> {
//! let service = SolveService::new(SolveParams::default());
//! let request = SolveRequest::new(
//!     "2026-01-05".parse().unwrap(),
//!     "2026-01-11".parse().unwrap(),
//! );
//! let response = service.solve("alice", &snapshot, &request, None)?;
//! println!("{} assignments", response.assignments.len());
//! # Ok(())
//! # }
//! ```

pub use medrota_core as core;
pub use medrota_cp as cp;
pub use medrota_engine as engine;

pub use medrota_core::{
    CalendarProjector, EligibilityMatrix, MinuteSpan, Result, RosterError, RowId, SlotInstance,
    SlotKey, StateSnapshot,
};
pub use medrota_cp::SolveStatus;
pub use medrota_engine::{
    EventBuffer, IncumbentEvent, ScheduleStats, SolveParams, SolveRequest, SolveResponse,
    SolveService, Weights,
};

/// The commonly used surface in one import.
pub mod prelude {
    pub use medrota_core::state::normalize;
    pub use medrota_core::StateSnapshot;
    pub use medrota_engine::{
        solve_range, EventBuffer, ObserverAction, SolveObserver, SolveParams, SolveRequest,
        SolveResponse, SolveService,
    };
}
