//! Unified error type for Chronicle.
//!
//! This module wraps the per-crate errors and presents one consistent
//! surface to users. Execution failures never appear here: they are data,
//! recorded inside terminal atomics.

use thiserror::Error;

/// All Chronicle errors.
#[derive(Debug, Error)]
pub enum Error {
    /// An append lost a race on a chain tip, or a hash collision on
    /// distinct content was detected
    #[error("chain integrity violation: {0}")]
    ChainIntegrity(String),

    /// A record was not appendable (e.g. no content hash)
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Underlying storage failure
    #[error("storage error: {0}")]
    Storage(String),

    /// A record could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The pipeline was misconfigured
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for Chronicle operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this is a chain-integrity failure. The loser of an append
    /// race sees this; the record it tried to append was superseded.
    pub fn is_chain_integrity(&self) -> bool {
        matches!(self, Error::ChainIntegrity(_))
    }

    /// Whether this is a storage failure. The append may succeed on retry
    /// once the backend recovers.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}

impl From<chronicle_ledger::LedgerError> for Error {
    fn from(e: chronicle_ledger::LedgerError) -> Self {
        use chronicle_ledger::LedgerError as LE;
        match e {
            LE::ChainIntegrity(msg) => Error::ChainIntegrity(msg),
            LE::InvalidRecord(msg) => Error::InvalidRecord(msg),
            LE::Storage(msg) => Error::Storage(msg),
            LE::Serialization(msg) => Error::Serialization(msg),
        }
    }
}

impl From<chronicle_executor::ExecutorError> for Error {
    fn from(e: chronicle_executor::ExecutorError) -> Self {
        use chronicle_executor::ExecutorError as EE;
        match e {
            EE::Ledger(inner) => inner.into(),
            EE::Core(inner) => inner.into(),
            EE::AlreadyTerminal(state) => {
                Error::InvalidRecord(format!("atomic is already terminal ({state})"))
            }
            EE::Config(msg) => Error::Config(msg),
        }
    }
}

impl From<chronicle_core::CoreError> for Error {
    fn from(e: chronicle_core::CoreError) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
