//! KVT - Store Module
//! The last-write-wins Key|Value|Timestamp store and its companions.
//!
//! Every write is gated on its timestamp: a write lands only if the key is
//! new here or the existing entry is strictly older. Two stores that have
//! seen the same writes, in any order, end up identical.

pub mod concurrent;
pub mod hash;
pub mod metrics;

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::hash::Hasher;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::clock::{Clock, SystemClock};
use crate::error::FormatError;
use crate::types::{Timestamp, ValueTimestamp};

use self::hash::Fnv64a;

/// A Key|Value|Timestamp store.
///
/// The map is private; the methods below are the only way to change it, so
/// timestamp gating always applies. Build a literal store with
/// `FromIterator`:
///
/// ```
/// use kvt::{Store, ValueTimestamp};
///
/// let store: Store = [
///     ("A".to_string(), ValueTimestamp::live("one", 1)),
///     ("B".to_string(), ValueTimestamp::tombstone(2)),
/// ]
/// .into_iter()
/// .collect();
/// assert_eq!(store.to_string(), r#"{"A":["one",1],"B":[null,2]}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Store {
    /// Sorted so encoding, hashing and `simple_string` share one order.
    entries: BTreeMap<String, ValueTimestamp>,
}

impl Store {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys, tombstones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store has no keys, not even tombstones.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The raw entry for a key. Unlike [`get`](Self::get), this tells a
    /// tombstone apart from a key never seen here.
    pub fn entry(&self, key: &str) -> Option<&ValueTimestamp> {
        self.entries.get(key)
    }

    /// Iterate entries in ascending key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, ValueTimestamp> {
        self.entries.iter()
    }

    /// Returns the value for a key; if the key does not exist or is marked
    /// deleted, an empty string is returned.
    pub fn get(&self, key: &str) -> String {
        self.entries
            .get(key)
            .and_then(ValueTimestamp::value)
            .unwrap_or_default()
            .to_string()
    }

    /// Equivalent to `set_timestamped(key, value, <now>)` using the system clock.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        self.set_with(&SystemClock, key, value)
    }

    /// Like [`set`](Self::set) but reads "now" from `clock`.
    pub fn set_with(
        &mut self,
        clock: &dyn Clock,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> bool {
        self.set_timestamped(key, value, clock.now_nanos())
    }

    /// Stores the value for the key as long as there isn't already an entry
    /// for that key with a newer or equal timestamp. Returns whether the
    /// write was applied; a stale write is discarded silently.
    pub fn set_timestamped(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        timestamp: Timestamp,
    ) -> bool {
        self.apply(key.into(), ValueTimestamp::live(value, timestamp))
    }

    /// Equivalent to `delete_timestamped(key, <now>)` using the system clock.
    pub fn delete(&mut self, key: impl Into<String>) -> bool {
        self.delete_with(&SystemClock, key)
    }

    /// Like [`delete`](Self::delete) but reads "now" from `clock`.
    pub fn delete_with(&mut self, clock: &dyn Clock, key: impl Into<String>) -> bool {
        self.delete_timestamped(key, clock.now_nanos())
    }

    /// Records a tombstone for the key as long as there isn't already an
    /// entry for that key with a newer or equal timestamp.
    pub fn delete_timestamped(&mut self, key: impl Into<String>, timestamp: Timestamp) -> bool {
        self.apply(key.into(), ValueTimestamp::tombstone(timestamp))
    }

    /// Discards tombstones strictly older than `cutoff`. Live entries are
    /// kept whatever their age. Returns the number of tombstones removed.
    pub fn purge(&mut self, cutoff: Timestamp) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !(entry.is_tombstone() && entry.timestamp() < cutoff));
        let purged = before - self.entries.len();
        log::debug!("Purged {} tombstones older than {}", purged, cutoff);
        purged
    }

    /// Updates this store with every strictly newer entry from `other`.
    ///
    /// Winning entries are copied, so `other` stays usable. On equal
    /// timestamps the entry already here is kept, which makes the merge
    /// order-sensitive when two writers share a clock tick. Returns the
    /// number of entries taken.
    pub fn absorb(&mut self, other: &Store) -> usize {
        let mut taken = 0;
        for (key, incoming) in &other.entries {
            if self.accepts(key, incoming.timestamp()) {
                self.entries.insert(key.clone(), incoming.clone());
                taken += 1;
            }
        }
        log::debug!("Absorbed {} of {} entries", taken, other.len());
        taken
    }

    /// Same as [`absorb`](Self::absorb), but consumes `other` and moves its
    /// winning entries instead of copying them.
    pub fn absorb_owned(&mut self, other: Store) -> usize {
        let offered = other.len();
        let mut taken = 0;
        for (key, incoming) in other.entries {
            if self.apply(key, incoming) {
                taken += 1;
            }
        }
        log::debug!("Absorbed {} of {} entries (owned)", taken, offered);
        taken
    }

    /// Returns a fingerprint that can be used to quickly detect whether two
    /// stores are in sync.
    ///
    /// Only keys and timestamps are hashed; values are not. Stores with the
    /// same keys at the same timestamps hash equal even if their values
    /// differ.
    pub fn hash(&self) -> String {
        let mut hasher = Fnv64a::new();
        for (key, entry) in &self.entries {
            hasher.write(format!("{}\n{}\n", key, entry.timestamp()).as_bytes());
        }
        hasher.hex()
    }

    /// JSON form: `{"key":[value_or_null,timestamp],...}`.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| format!("error encoding store: {}", err))
    }

    /// Decode a store from its JSON form. One bad entry rejects the whole
    /// payload.
    pub fn from_json(raw: &str) -> Result<Self, FormatError> {
        let raw_entries: BTreeMap<String, &RawValue> = serde_json::from_str(raw)?;
        raw_entries
            .into_iter()
            .map(|(key, raw_entry)| {
                Ok::<_, FormatError>((key, ValueTimestamp::from_json(raw_entry.get())?))
            })
            .collect()
    }

    /// `key=value[,key=value]` form, key-sorted, with `key/deleted` for
    /// tombstones and no timestamps; handy in tests.
    pub fn simple_string(&self) -> String {
        self.entries
            .iter()
            .map(|(key, entry)| match entry.value() {
                Some(value) => format!("{}={}", key, value),
                None => format!("{}/deleted", key),
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    fn accepts(&self, key: &str, timestamp: Timestamp) -> bool {
        self.entries
            .get(key)
            .map_or(true, |existing| existing.timestamp() < timestamp)
    }

    fn apply(&mut self, key: String, incoming: ValueTimestamp) -> bool {
        match self.entries.entry(key) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(incoming);
                true
            }
            btree_map::Entry::Occupied(mut slot) => {
                if slot.get().timestamp() < incoming.timestamp() {
                    slot.insert(incoming);
                    true
                } else {
                    log::trace!(
                        "Discarded stale write for {:?} at {} (have {})",
                        slot.key(),
                        incoming.timestamp(),
                        slot.get().timestamp()
                    );
                    false
                }
            }
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

/// Collecting goes through the same gating as writes, so duplicate keys
/// resolve to the newest entry.
impl FromIterator<(String, ValueTimestamp)> for Store {
    fn from_iter<I: IntoIterator<Item = (String, ValueTimestamp)>>(iter: I) -> Self {
        let mut store = Store::new();
        store.extend(iter);
        store
    }
}

impl Extend<(String, ValueTimestamp)> for Store {
    fn extend<I: IntoIterator<Item = (String, ValueTimestamp)>>(&mut self, iter: I) {
        for (key, entry) in iter {
            self.apply(key, entry);
        }
    }
}

impl<'a> IntoIterator for &'a Store {
    type Item = (&'a String, &'a ValueTimestamp);
    type IntoIter = btree_map::Iter<'a, String, ValueTimestamp>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for Store {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Store {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<String, ValueTimestamp>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}
