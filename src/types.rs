//! KVT - Core Type Definitions
//! Defines the per-key entry and its JSON wire form.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeTuple, Serializer};
use serde_json::value::RawValue;
use serde_json::Value as JsonValue;

use crate::error::FormatError;

/// Nanosecond timestamp. Higher is newer.
pub type Timestamp = i64;

/// The Value|Timestamp pair stored for each key.
///
/// A `None` value is a tombstone (deletion marker). Tombstones keep their
/// timestamp so a deletion can outrace older writes during a merge, and are
/// usually dropped after some time with [`Store::purge`](crate::store::Store::purge).
///
/// ## Wire Format
/// ```text
/// ["value", 1483326245000000006]
/// [null, 1483326245000000006]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueTimestamp {
    value: Option<String>,
    timestamp: Timestamp,
}

impl ValueTimestamp {
    /// Create an entry from an optional value and a timestamp.
    pub fn new(value: Option<String>, timestamp: Timestamp) -> Self {
        Self { value, timestamp }
    }

    /// Create a live entry.
    pub fn live(value: impl Into<String>, timestamp: Timestamp) -> Self {
        Self::new(Some(value.into()), timestamp)
    }

    /// Create a tombstone entry.
    pub fn tombstone(timestamp: Timestamp) -> Self {
        Self::new(None, timestamp)
    }

    /// The live value, or `None` for a tombstone.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// When the value was written or the key deleted.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Returns true if this entry is a tombstone.
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    /// Encode as a `[value_or_null, timestamp]` JSON array.
    pub fn to_json(&self) -> String {
        serde_json::json!([self.value, self.timestamp]).to_string()
    }

    /// Decode from a `[value_or_null, timestamp]` JSON array.
    ///
    /// Errors other than plain parse failures echo `raw` in their message.
    pub fn from_json(raw: &str) -> Result<Self, FormatError> {
        let items: Vec<JsonValue> = serde_json::from_str(raw)?;
        Self::from_items(items, raw)
    }

    fn from_items(items: Vec<JsonValue>, raw: &str) -> Result<Self, FormatError> {
        if items.len() != 2 {
            return Err(FormatError::Shape {
                raw: raw.to_string(),
            });
        }
        let mut items = items.into_iter();

        let value = match items.next() {
            Some(JsonValue::Null) => None,
            Some(JsonValue::String(value)) => Some(value),
            _ => {
                return Err(FormatError::InvalidValue {
                    raw: raw.to_string(),
                })
            }
        };

        let timestamp = items
            .next()
            .as_ref()
            .and_then(integral_timestamp)
            .ok_or_else(|| FormatError::InvalidTimestamp {
                raw: raw.to_string(),
            })?;

        Ok(Self { value, timestamp })
    }
}

/// Accept integers losslessly, and floats only when they have no fractional
/// part and fit in i64.
fn integral_timestamp(item: &JsonValue) -> Option<Timestamp> {
    let JsonValue::Number(number) = item else {
        return None;
    };
    if let Some(timestamp) = number.as_i64() {
        return Some(timestamp);
    }
    if number.is_u64() {
        return None;
    }
    let float = number.as_f64()?;
    if float.fract() == 0.0 && float > i64::MIN as f64 && float < i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}

impl fmt::Display for ValueTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{},{}", value, self.timestamp),
            None => write!(f, "nil,{}", self.timestamp),
        }
    }
}

impl Serialize for ValueTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.value)?;
        tuple.serialize_element(&self.timestamp)?;
        tuple.end()
    }
}

/// Only works with `serde_json` deserializers; the entry is captured as raw
/// JSON text so errors echo the caller's input exactly.
impl<'de> Deserialize<'de> for ValueTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Self::from_json(raw.get()).map_err(de::Error::custom)
    }
}
