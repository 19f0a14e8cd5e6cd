//! Wire-neutral solve request and response payloads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use medrota_core::domain::Assignment;
use medrota_core::{Result, RosterError};

use crate::diagnostics::DebugInfo;

/// A request to (re-)solve an inclusive date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveRequest {
    #[serde(rename = "startISO")]
    pub start: NaiveDate,
    /// Defaults to six days after the start (one week).
    #[serde(rename = "endISO", default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    /// When false, distribute-all mode: capacity is bounded only by
    /// feasibility.
    #[serde(default)]
    pub only_fill_required: bool,
    /// Opaque token an abort request can reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort_token: Option<String>,
}

impl SolveRequest {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end: Some(end),
            only_fill_required: false,
            abort_token: None,
        }
    }

    pub fn only_required(mut self) -> Self {
        self.only_fill_required = true;
        self
    }

    /// Resolved inclusive range, validating order.
    pub fn range(&self) -> Result<(NaiveDate, NaiveDate)> {
        let end = self
            .end
            .unwrap_or_else(|| self.start + chrono::Duration::days(6));
        if end < self.start {
            return Err(RosterError::InvalidRange(format!(
                "end {end} before start {}",
                self.start
            )));
        }
        Ok((self.start, end))
    }
}

/// The shaped result of one solve run.
#[derive(Debug, Clone, Serialize)]
pub struct SolveResponse {
    #[serde(rename = "startISO")]
    pub start: NaiveDate,
    #[serde(rename = "endISO")]
    pub end: NaiveDate,
    pub assignments: Vec<Assignment>,
    pub notes: Vec<String>,
    #[serde(rename = "debugInfo")]
    pub debug_info: DebugInfo,
}
