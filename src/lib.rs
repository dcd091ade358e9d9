//! KVT - Key|Value|Timestamp Store
//!
//! A small in-memory key-value store you can merge with other copies of
//! itself. Every entry carries a nanosecond timestamp and the newest write
//! wins, so stores updated independently on several machines converge once
//! they exchange snapshots.
//!
//! ## Features
//! - **Timestamp-gated writes**: stale sets and deletes are dropped silently
//! - **Tombstones**: deletions are entries too, so they survive merges
//! - **Absorb**: merge another store, keeping the newest entry per key
//! - **Purge**: drop tombstones older than a cutoff
//! - **Hash**: FNV-1a fingerprint of (key, timestamp) pairs for cheap sync checks
//! - **JSON**: stable `{"key":[value_or_null,timestamp]}` wire format
//! - **Concurrency**: thread-safe Arc + RwLock wrapper with an injectable clock
//!
//! ## Example
//! ```
//! use kvt::Store;
//!
//! let mut store1 = Store::new();
//! store1.set_timestamped("A", "one", 1);
//! store1.set_timestamped("B", "two", 1);
//!
//! let mut store2 = Store::new();
//! store2.delete_timestamped("B", 2);
//! store2.set_timestamped("C", "three", 2);
//!
//! store1.absorb(&store2);
//! assert_eq!(store1.simple_string(), "A=one,B/deleted,C=three");
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{FormatError, KvtError, Result};
pub use store::concurrent::ConcurrentStore;
pub use store::Store;
pub use types::{Timestamp, ValueTimestamp};
