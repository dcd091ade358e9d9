//! KVT - Store Metrics
//! Atomic counters for gated writes, merges and purges, tracked
//! lock-free with `AtomicU64`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Atomic operation counters for a [`ConcurrentStore`](super::concurrent::ConcurrentStore).
///
/// All counters use `Ordering::Relaxed`; they are for observability only
/// and never used for synchronization.
#[derive(Debug)]
pub struct StoreMetrics {
    /// Sets and deletes that landed.
    pub writes_applied: AtomicU64,
    /// Sets and deletes dropped because an equal or newer entry existed.
    pub writes_discarded: AtomicU64,
    /// Number of absorb calls.
    pub absorbs: AtomicU64,
    /// Entries taken from donors across all absorbs.
    pub entries_absorbed: AtomicU64,
    /// Tombstones removed by purges.
    pub tombstones_purged: AtomicU64,
    started: Instant,
}

impl StoreMetrics {
    /// Create a new metrics instance with all counters at zero.
    pub fn new() -> Self {
        Self {
            writes_applied: AtomicU64::new(0),
            writes_discarded: AtomicU64::new(0),
            absorbs: AtomicU64::new(0),
            entries_absorbed: AtomicU64::new(0),
            tombstones_purged: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Record the outcome of a gated set or delete.
    pub fn record_write(&self, applied: bool) {
        if applied {
            self.writes_applied.fetch_add(1, Ordering::Relaxed);
        } else {
            self.writes_discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an absorb that took `taken` entries.
    pub fn record_absorb(&self, taken: usize) {
        self.absorbs.fetch_add(1, Ordering::Relaxed);
        self.entries_absorbed
            .fetch_add(taken as u64, Ordering::Relaxed);
    }

    /// Record a purge that removed `purged` tombstones.
    pub fn record_purge(&self, purged: usize) {
        self.tombstones_purged
            .fetch_add(purged as u64, Ordering::Relaxed);
    }

    /// Seconds since the metrics were created.
    pub fn uptime_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Applied plus discarded writes.
    pub fn total_writes(&self) -> u64 {
        self.writes_applied.load(Ordering::Relaxed) + self.writes_discarded.load(Ordering::Relaxed)
    }

    /// Format metrics as a human-readable report.
    pub fn report(&self) -> String {
        format!(
            "\n═══ KVT Store Metrics ═══\n\
             Writes:\n\
               applied:   {}\n\
               discarded: {}\n\
               total:     {}\n\
             Merges:\n\
               absorbs:   {}\n\
               absorbed:  {} entries\n\
             Purges:\n\
               purged:    {} tombstones\n\
             Uptime: {:.2}s",
            self.writes_applied.load(Ordering::Relaxed),
            self.writes_discarded.load(Ordering::Relaxed),
            self.total_writes(),
            self.absorbs.load(Ordering::Relaxed),
            self.entries_absorbed.load(Ordering::Relaxed),
            self.tombstones_purged.load(Ordering::Relaxed),
            self.uptime_secs(),
        )
    }
}

impl Default for StoreMetrics {
    fn default() -> Self {
        Self::new()
    }
}
