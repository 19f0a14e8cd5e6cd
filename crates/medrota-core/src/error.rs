//! Error types for medrota

use thiserror::Error;

/// Main error type for medrota operations.
///
/// Only boundary validation rejects a request; recoverable conditions
/// inside the core (malformed slot times, deprecated state, unreachable
/// coverage) are reported as notes instead.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Malformed time of day (expected `HH:MM`)
    #[error("invalid time of day `{0}`: expected HH:MM")]
    TimeParse(String),

    /// Malformed calendar date (expected `YYYY-MM-DD`)
    #[error("invalid date `{0}`: expected YYYY-MM-DD")]
    DateParse(String),

    /// Requested date range is empty or inverted
    #[error("invalid date range: {0}")]
    InvalidRange(String),

    /// Another solve is already in flight for the same user
    #[error("a solve is already running for user `{0}`")]
    ConflictingSolve(String),

    /// The search backend failed in an unexpected way
    #[error("solver backend error: {0}")]
    Backend(String),

    /// The state snapshot could not be interpreted
    #[error("invalid state snapshot: {0}")]
    Snapshot(String),
}

/// Result type alias for medrota operations
pub type Result<T> = std::result::Result<T, RosterError>;
