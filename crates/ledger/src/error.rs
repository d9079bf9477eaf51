//! Error types for ledger operations.
//!
//! ## Propagation policy
//!
//! Integrity and storage errors at the ledger boundary are real failures
//! and propagate to the caller so it can retry or alert. They are never
//! silently absorbed. (Execution-time failures, by contrast, are data:
//! they live inside terminal records, not in this type.)

use thiserror::Error;

/// Errors surfaced by [`crate::Ledger`] operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// An append targeted a stale chain tip, or a hash collision on
    /// distinct content was detected. Fatal to that append.
    #[error("chain integrity violation: {0}")]
    ChainIntegrity(String),

    /// The record is not appendable (e.g. it carries no content hash).
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Underlying backend I/O failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// A record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    /// Whether this is a chain-integrity failure (lost race or collision).
    pub fn is_chain_integrity(&self) -> bool {
        matches!(self, LedgerError::ChainIntegrity(_))
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(e: std::io::Error) -> Self {
        LedgerError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}

impl From<chronicle_core::CoreError> for LedgerError {
    fn from(e: chronicle_core::CoreError) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}
