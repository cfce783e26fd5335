//! Error types for Playbox storage operations.
//!
//! The fail-open store API never surfaces these to game code; they exist for
//! the fallible `try_*` operations, for backends, and for logging.

use thiserror::Error;

/// Result type alias for Playbox operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Core error type for storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Value could not be turned into JSON
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored payload could not be parsed back into the requested type
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Backend read/write failure
    #[error("Storage error: {0}")]
    Backend(String),

    /// Write rejected because the backend is full
    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    /// Backend is disabled or cannot be reached
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Namespace is empty or contains a reserved character
    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    /// Key is empty
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            StoreError::Backend(err.to_string())
        } else if err.is_data() || err.is_syntax() || err.is_eof() {
            StoreError::Deserialization(err.to_string())
        } else {
            StoreError::Serialization(err.to_string())
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_maps_to_deserialization() {
        let err = serde_json::from_str::<u32>("{not json").unwrap_err();
        assert!(matches!(StoreError::from(err), StoreError::Deserialization(_)));
    }

    #[test]
    fn test_type_mismatch_maps_to_deserialization() {
        let err = serde_json::from_str::<u32>("\"text\"").unwrap_err();
        assert!(matches!(StoreError::from(err), StoreError::Deserialization(_)));
    }

    #[test]
    fn test_quota_message() {
        let err = StoreError::QuotaExceeded {
            needed: 10,
            available: 4,
        };
        assert_eq!(
            err.to_string(),
            "Storage quota exceeded: 10 bytes needed, 4 available"
        );
    }
}
