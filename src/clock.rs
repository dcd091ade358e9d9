//! KVT - Clock Abstraction
//! Time source for the `set`/`delete` convenience writers.
//!
//! Merge and query paths never read the clock; only the "now" writers do,
//! so tests can swap in a [`ManualClock`] for deterministic timestamps.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::Timestamp;

/// Trait for getting the current time in nanoseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_nanos(&self) -> Timestamp;
}

/// Real system clock implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_nanos(&self) -> Timestamp {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(since) => i64::try_from(since.as_nanos()).unwrap_or(i64::MAX),
            // Clock set before 1970.
            Err(err) => i64::try_from(err.duration().as_nanos())
                .map(|before| -before)
                .unwrap_or(i64::MIN),
        }
    }
}

/// Settable clock for tests. Every read returns the current setting.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock pinned at `now`.
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Jump the clock to `now`, backwards if need be.
    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock forward by `nanos` and return the new time.
    pub fn advance(&self, nanos: i64) -> Timestamp {
        self.now
            .fetch_add(nanos, Ordering::SeqCst)
            .wrapping_add(nanos)
    }
}

impl Clock for ManualClock {
    fn now_nanos(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
