//! Concurrency guard keeping executions of one job from overlapping.
//!
//! Each registered job owns an `OverlapGuard`. A tick or manual trigger must
//! win the guard before it may invoke the callback; a loser is skipped, never
//! queued. The guard is shared across re-registrations of the same id so a
//! replaced job cannot start while its predecessor's callback is in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared in-flight flag for one job id.
#[derive(Debug, Clone, Default)]
pub struct OverlapGuard {
    in_flight: Arc<AtomicBool>,
}

impl OverlapGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim the job for one execution.
    ///
    /// Returns `None` when another execution already holds the guard.
    pub fn try_acquire(&self) -> Option<RunGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                flag: self.in_flight.clone(),
            })
    }

    /// Whether an execution currently holds the guard.
    pub fn is_held(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Releases the guard when dropped, including on panic or early return.
#[derive(Debug)]
pub struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
