//! Per-user solve gate and abort registry.
//!
//! Each user may have at most one solve in flight; further requests are
//! rejected at the boundary. Abort requests address a running solve by
//! user id or by the request's opaque abort token.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use medrota_core::state::StateSnapshot;
use medrota_core::{Result, RosterError};

use crate::config::SolveParams;
use crate::driver;
use crate::events::SolveObserver;
use crate::request::{SolveRequest, SolveResponse};

/// Entry point for user-scoped solves.
///
/// # Example
///
/// ```no_run
/// use medrota_engine::config::SolveParams;
/// use medrota_engine::gate::SolveService;
///
/// let service = SolveService::new(SolveParams::default());
/// // service.solve("alice", &snapshot, &request, None)?;
/// ```
pub struct SolveService {
    params: SolveParams,
    inflight: Mutex<HashMap<String, Arc<AtomicBool>>>,
    tokens: Mutex<HashMap<String, Arc<AtomicBool>>>,
}

impl SolveService {
    pub fn new(params: SolveParams) -> Self {
        Self {
            params,
            inflight: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
        }
    }

    pub fn params(&self) -> &SolveParams {
        &self.params
    }

    /// Runs a solve for one user over a snapshot taken at request time.
    ///
    /// Returns [`RosterError::ConflictingSolve`] when the user already has
    /// a solve in flight.
    pub fn solve(
        &self,
        user_id: &str,
        snapshot: &StateSnapshot,
        request: &SolveRequest,
        observer: Option<&dyn SolveObserver>,
    ) -> Result<SolveResponse> {
        let flag = {
            let mut inflight = self.inflight.lock();
            if inflight.contains_key(user_id) {
                return Err(RosterError::ConflictingSolve(user_id.to_string()));
            }
            let flag = Arc::new(AtomicBool::new(false));
            inflight.insert(user_id.to_string(), flag.clone());
            flag
        };
        if let Some(token) = &request.abort_token {
            self.tokens.lock().insert(token.clone(), flag.clone());
        }

        let result =
            driver::solve_range_with_abort(snapshot, request, &self.params, observer, flag);

        self.inflight.lock().remove(user_id);
        if let Some(token) = &request.abort_token {
            self.tokens.lock().remove(token);
        }
        result
    }

    /// Requests a cooperative abort by user id or abort token.
    ///
    /// Returns false when nothing is running under that key.
    pub fn abort(&self, key: &str) -> bool {
        if let Some(flag) = self.inflight.lock().get(key) {
            flag.store(true, Ordering::SeqCst);
            return true;
        }
        if let Some(flag) = self.tokens.lock().get(key) {
            flag.store(true, Ordering::SeqCst);
            return true;
        }
        false
    }

    pub fn is_solving(&self, user_id: &str) -> bool {
        self.inflight.lock().contains_key(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_without_running_solve_is_a_noop() {
        let service = SolveService::new(SolveParams::default());
        assert!(!service.abort("nobody"));
        assert!(!service.is_solving("nobody"));
    }
}
