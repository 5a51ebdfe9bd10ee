//! Shared counter of executed object-store transactions.
//!
//! The original SDK kept this as a hidden process-wide static. Here it is an
//! explicit, cloneable handle: construct one, pass it to every
//! [`Account::authenticate`](crate::account::Account::authenticate) call
//! whose transactions should be counted together, and read it wherever the
//! figure is needed. Cloning shares the underlying counter; it is never
//! reset. Increments are atomic, so counting is accurate under concurrent
//! use.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonically increasing count of transaction sends.
///
/// Incremented exactly once per executed transaction (including the replay
/// after a stale-token refresh, which is a second send). Authentication
/// calls do not count.
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    count: Arc<AtomicU64>,
}

impl CallCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment and return the new value.
    pub fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Current number of sends observed.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
