//! KVT - Concurrent Store Wrapper
//! Thread-safe wrapper around [`Store`] using Arc + RwLock.
//!
//! ## Concurrency Model
//! - **Read operations** (`get`, `hash`, `simple_string`, `to_json`, `snapshot`)
//!   acquire a **read lock** (shared)
//! - **Write operations** (`set`, `delete`, `purge`, `absorb`) acquire a
//!   **write lock** (exclusive)
//! - `absorb` never holds two locks at once: the donor is snapshotted under
//!   its read lock, released, then merged under the receiver's write lock
//!
//! The "now" writers read the injected [`Clock`], so tests can pin time.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::Result;
use crate::types::Timestamp;

use super::metrics::StoreMetrics;
use super::Store;

/// Thread-safe, cheaply cloneable handle to a shared [`Store`].
///
/// ## Example
/// ```
/// use kvt::config::Config;
/// use kvt::store::concurrent::ConcurrentStore;
/// use std::thread;
///
/// let store = ConcurrentStore::open(Config::default()).unwrap();
/// let store_clone = store.clone();
///
/// thread::spawn(move || {
///     store_clone.set("key", "value");
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(store.get("key"), "value");
/// ```
#[derive(Clone)]
pub struct ConcurrentStore {
    inner: Arc<RwLock<Store>>,
    clock: Arc<dyn Clock>,
    config: Config,
    metrics: Arc<StoreMetrics>,
}

impl ConcurrentStore {
    /// Create an empty concurrent store on the system clock.
    pub fn open(config: Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an empty concurrent store reading time from `clock`.
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::from_store(Store::new(), config, clock)
    }

    /// Wrap an existing store.
    pub fn from_store(store: Store, config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        log::debug!(
            "Concurrent store opened ({} entries, tombstone retention {:?})",
            store.len(),
            config.tombstone_retention
        );
        Ok(Self {
            inner: Arc::new(RwLock::new(store)),
            clock,
            config,
            metrics: Arc::new(StoreMetrics::new()),
        })
    }

    /// Decode a JSON payload into a new concurrent store.
    pub fn from_json(raw: &str, config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let store = Store::from_json(raw)?;
        Self::from_store(store, config, clock)
    }

    /// The configuration this store was opened with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a live value (read lock). Empty for missing or deleted keys.
    pub fn get(&self, key: &str) -> String {
        self.read().get(key)
    }

    /// Set at the clock's current time (write lock).
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let now = self.clock.now_nanos();
        self.set_timestamped(key, value, now)
    }

    /// Timestamp-gated set (write lock).
    pub fn set_timestamped(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
        timestamp: Timestamp,
    ) -> bool {
        let applied = self.write().set_timestamped(key, value, timestamp);
        self.metrics.record_write(applied);
        applied
    }

    /// Delete at the clock's current time (write lock).
    pub fn delete(&self, key: impl Into<String>) -> bool {
        let now = self.clock.now_nanos();
        self.delete_timestamped(key, now)
    }

    /// Timestamp-gated delete (write lock).
    pub fn delete_timestamped(&self, key: impl Into<String>, timestamp: Timestamp) -> bool {
        let applied = self.write().delete_timestamped(key, timestamp);
        self.metrics.record_write(applied);
        applied
    }

    /// Drop tombstones older than `cutoff` (write lock).
    pub fn purge(&self, cutoff: Timestamp) -> usize {
        let purged = self.write().purge(cutoff);
        self.metrics.record_purge(purged);
        purged
    }

    /// Drop tombstones older than the configured retention, measured from
    /// the clock's current time.
    pub fn purge_expired(&self) -> usize {
        let cutoff = self.config.cutoff(self.clock.now_nanos());
        self.purge(cutoff)
    }

    /// Merge another shared store into this one. Absorbing a handle to the
    /// same store is a no-op.
    pub fn absorb(&self, other: &ConcurrentStore) -> usize {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            self.metrics.record_absorb(0);
            return 0;
        }
        let donor = other.snapshot();
        self.absorb_owned(donor)
    }

    /// Merge a plain store, copying winning entries (write lock).
    pub fn absorb_store(&self, other: &Store) -> usize {
        let taken = self.write().absorb(other);
        self.metrics.record_absorb(taken);
        taken
    }

    /// Merge a plain store, moving winning entries (write lock).
    pub fn absorb_owned(&self, other: Store) -> usize {
        let taken = self.write().absorb_owned(other);
        self.metrics.record_absorb(taken);
        taken
    }

    /// Copy of the current contents (read lock).
    pub fn snapshot(&self) -> Store {
        self.read().clone()
    }

    /// Fingerprint of (key, timestamp) pairs (read lock).
    pub fn hash(&self) -> String {
        self.read().hash()
    }

    /// `key=value` / `key/deleted` listing (read lock).
    pub fn simple_string(&self) -> String {
        self.read().simple_string()
    }

    /// JSON form of the whole store (read lock).
    pub fn to_json(&self) -> String {
        self.read().to_json()
    }

    /// Number of keys, tombstones included (read lock).
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if the store holds no keys (read lock).
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Run `f` against the shared metrics.
    pub fn with_metrics<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&StoreMetrics) -> R,
    {
        f(&self.metrics)
    }

    // Every mutation is a single map operation, so a writer that panicked
    // cannot leave the map half-updated; poisoned locks are safe to reuse.
    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.inner.read().unwrap_or_else(|poisoned| {
            log::warn!("Recovering poisoned store lock (read)");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.inner.write().unwrap_or_else(|poisoned| {
            log::warn!("Recovering poisoned store lock (write)");
            poisoned.into_inner()
        })
    }
}
