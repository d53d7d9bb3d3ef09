//! Storage-specific error types
//!
//! Errors raised by key-value storage drivers (connection loss, bad data, etc.)

use thiserror::Error;

/// Errors that can occur while talking to a storage driver
#[derive(Error, Debug)]
pub enum StorageError {
    /// The storage backend could not be reached or refused the operation
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The backend returned an error while executing a query
    #[error("Storage backend error: {0}")]
    Backend(#[from] sqlx::Error),

    /// A stored value could not be decoded
    #[error("Corrupt value for {namespace}:{key}: {reason}")]
    Corrupt {
        /// Namespace the value lives in
        namespace: String,
        /// Key of the unreadable value
        key: String,
        /// Decoder message
        reason: String,
    },

    /// A value could not be encoded before writing
    #[error("Failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}
