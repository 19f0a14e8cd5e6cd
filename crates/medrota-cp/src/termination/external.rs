//! External termination via an atomic abort flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{StopCause, Termination};
use crate::stats::SearchStats;

/// Terminates when an external flag is raised.
///
/// The flag is shared with the caller, which sets it to request a
/// cooperative abort.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use medrota_cp::termination::ExternalTermination;
///
/// let flag = Arc::new(AtomicBool::new(false));
/// let term = ExternalTermination::new(flag.clone());
///
/// // Later: flag.store(true, Ordering::SeqCst);
/// ```
#[derive(Debug, Clone)]
pub struct ExternalTermination {
    flag: Arc<AtomicBool>,
}

impl ExternalTermination {
    pub fn new(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }
}

impl Termination for ExternalTermination {
    fn check(&self, _stats: &SearchStats) -> Option<StopCause> {
        self.flag
            .load(Ordering::Relaxed)
            .then_some(StopCause::External)
    }
}
