//! KVT - Store Configuration
//! Defines tunable parameters for tombstone retention.

use std::time::Duration;

use crate::error::{KvtError, Result};
use crate::types::Timestamp;

/// Configuration for a [`ConcurrentStore`](crate::store::concurrent::ConcurrentStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How long a tombstone is kept before `purge_expired` may drop it.
    /// Peers that sync less often than this can resurrect deleted keys.
    pub tombstone_retention: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tombstone_retention: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
        }
    }
}

impl Config {
    /// Create a new Config with a custom tombstone retention.
    pub fn new(tombstone_retention: Duration) -> Self {
        Self {
            tombstone_retention,
        }
    }

    /// Set the tombstone retention.
    pub fn with_tombstone_retention(mut self, retention: Duration) -> Self {
        self.tombstone_retention = retention;
        self
    }

    /// Ensure the retention can be expressed as i64 nanoseconds.
    pub fn validate(&self) -> Result<()> {
        self.retention_nanos().map(|_| ()).ok_or_else(|| {
            KvtError::Config(format!(
                "tombstone retention {:?} does not fit in i64 nanoseconds",
                self.tombstone_retention
            ))
        })
    }

    /// Purge cutoff for the given current time: tombstones older than this
    /// are expired.
    pub fn cutoff(&self, now: Timestamp) -> Timestamp {
        now.saturating_sub(self.retention_nanos().unwrap_or(i64::MAX))
    }

    fn retention_nanos(&self) -> Option<i64> {
        i64::try_from(self.tombstone_retention.as_nanos()).ok()
    }
}
