use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::foundation::error::BoardgifError;

/// Records the first error reported by any job of a run.
///
/// Later errors are logged and dropped; the first one is what the run reports.
#[derive(Debug, Default)]
pub struct FirstFailure {
    tripped: AtomicBool,
    first: Mutex<Option<BoardgifError>>,
}

impl FirstFailure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `err`. Returns `true` when it became the run's reported error.
    pub fn record(&self, err: BoardgifError) -> bool {
        let mut slot = self.first.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() || self.tripped.load(Ordering::Acquire) {
            tracing::debug!(error = %err, "dropping error reported after the first failure");
            return false;
        }
        tracing::warn!(error = %err, "job failed");
        *slot = Some(err);
        self.tripped.store(true, Ordering::Release);
        true
    }

    /// Cheap check used by jobs to skip work once the run has failed.
    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Take the recorded error, leaving the latch tripped.
    pub fn take(&self) -> Option<BoardgifError> {
        self.first
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
