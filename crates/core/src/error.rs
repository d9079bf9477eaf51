//! Error types for the core crate.

use thiserror::Error;

/// Errors from hashing and signing operations.
///
/// Verification never reports through this type: `verify_hash`,
/// `verify_signature`, and `verify` return booleans so callers can audit
/// records without error plumbing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A record could not be canonicalized for hashing
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A signing operation needed a content hash that was not present
    #[error("record has no content hash")]
    MissingHash,

    /// Key material could not be decoded
    #[error("invalid key material: {0}")]
    InvalidKey(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}
