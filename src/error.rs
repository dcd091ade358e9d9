//! KVT - Error Types
//! Defines the error hierarchy for decoding stores and validating config.

use thiserror::Error;

/// Custom Result type for the kvt crate.
pub type Result<T> = std::result::Result<T, KvtError>;

/// Decode-time failures for entries and stores.
///
/// Every variant except `Json` echoes the raw JSON fragment that was rejected.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The input was not JSON of the expected container type.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// The entry array did not hold exactly two elements.
    #[error("expected [value,timestamp] from: {raw}")]
    Shape { raw: String },

    /// The first element was neither a string nor null.
    #[error("invalid value from: {raw}")]
    InvalidValue { raw: String },

    /// The second element was not an integral number in i64 range.
    #[error("invalid timestamp from: {raw}")]
    InvalidTimestamp { raw: String },
}

/// Top-level error type for the kvt crate.
#[derive(Error, Debug)]
pub enum KvtError {
    /// Malformed entry or store payload.
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
