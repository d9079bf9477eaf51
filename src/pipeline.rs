//! Main entry point for Chronicle.
//!
//! This module provides the [`Chronicle`] struct, which wires a ledger
//! and an execution backend into one processing pipeline. All
//! dependencies are injected through the builder; there is no shared
//! global instance.

use crate::error::{Error, Result};
use chronicle_core::{Atomic, SigningKey, VerifyingKey};
use chronicle_executor::{AtomicExecutor, ExecutionBackend};
use chronicle_ledger::{
    transfer, AtomicFilter, ChainVerification, Durability, FileLedger, Ledger, LedgerStats,
    MemoryLedger, ScanOptions, ScanPage, ImportReport,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// The Chronicle pipeline: an executor over an append-only ledger.
///
/// # Example
///
/// ```ignore
/// use chronicle::prelude::*;
///
/// let chronicle = Chronicle::builder()
///     .file("./actions.jsonl")
///     .backend(my_backend)
///     .build()?;
///
/// let atomic = Atomic::new("noop", Did::new("A", "run"));
/// let terminal = chronicle.process(atomic)?;
/// assert!(terminal.is_terminal());
/// ```
pub struct Chronicle {
    ledger: Arc<dyn Ledger>,
    executor: AtomicExecutor,
}

impl Chronicle {
    /// Create a builder for pipeline configuration.
    pub fn builder() -> ChronicleBuilder {
        ChronicleBuilder::default()
    }

    /// Process one atomic to a terminal record and append it.
    ///
    /// Never fails on account of the execution itself; see
    /// [`AtomicExecutor::process`].
    pub fn process(&self, atomic: Atomic) -> Result<Atomic> {
        Ok(self.executor.process(atomic)?)
    }

    /// Whether a record with this content hash is stored.
    pub fn contains(&self, hash: &str) -> Result<bool> {
        Ok(self.ledger.contains(hash)?)
    }

    /// Query stored records; see [`AtomicFilter`].
    pub fn query(&self, filter: &AtomicFilter) -> Result<Vec<Atomic>> {
        Ok(self.ledger.query(filter)?)
    }

    /// Page through all stored records.
    pub fn scan(&self, options: &ScanOptions) -> Result<ScanPage> {
        Ok(self.ledger.scan(options)?)
    }

    /// Ledger aggregates.
    pub fn stats(&self) -> Result<LedgerStats> {
        Ok(self.ledger.stats()?)
    }

    /// Audit every stored record.
    pub fn verify_chain(&self, key: Option<&VerifyingKey>) -> Result<ChainVerification> {
        Ok(self.ledger.verify_chain(key)?)
    }

    /// Export the whole ledger, in insertion order.
    pub fn export(&self) -> Result<Vec<Atomic>> {
        Ok(transfer::export(self.ledger.as_ref())?)
    }

    /// Export the whole ledger as a JSON array.
    pub fn export_json(&self) -> Result<String> {
        Ok(transfer::export_json(self.ledger.as_ref())?)
    }

    /// Replay exported records through `append`, in order.
    pub fn import(&self, records: Vec<Atomic>) -> Result<ImportReport> {
        Ok(transfer::import(self.ledger.as_ref(), records)?)
    }

    /// Import from a JSON array produced by [`Chronicle::export_json`].
    pub fn import_json(&self, json: &str) -> Result<ImportReport> {
        Ok(transfer::import_json(self.ledger.as_ref(), json)?)
    }

    /// The underlying ledger, for callers that need direct access.
    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }
}

enum LedgerChoice {
    Explicit(Arc<dyn Ledger>),
    Memory,
    File(PathBuf),
}

/// Builder for [`Chronicle`].
///
/// # Example
///
/// ```ignore
/// // Durable pipeline with a 30s execution deadline
/// let chronicle = Chronicle::builder()
///     .file("./actions.jsonl")
///     .backend(backend)
///     .deadline(Duration::from_secs(30))
///     .build()?;
///
/// // Test pipeline: volatile ledger, no deadline
/// let chronicle = Chronicle::builder()
///     .memory()
///     .backend(backend)
///     .build()?;
/// ```
#[derive(Default)]
pub struct ChronicleBuilder {
    ledger: Option<LedgerChoice>,
    durability: Durability,
    backend: Option<Arc<dyn ExecutionBackend>>,
    deadline: Option<Duration>,
    signing_key: Option<SigningKey>,
}

impl ChronicleBuilder {
    /// Use a caller-constructed ledger backend.
    pub fn ledger(mut self, ledger: Arc<dyn Ledger>) -> Self {
        self.ledger = Some(LedgerChoice::Explicit(ledger));
        self
    }

    /// Use the volatile in-memory ledger (degraded/test configuration).
    pub fn memory(mut self) -> Self {
        self.ledger = Some(LedgerChoice::Memory);
        self
    }

    /// Use the durable file-backed ledger at `path`.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger = Some(LedgerChoice::File(path.into()));
        self
    }

    /// Durability mode for the file-backed ledger (default: strict).
    pub fn durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    /// The execution backend (required).
    pub fn backend(mut self, backend: Arc<dyn ExecutionBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Bound every backend invocation to a deadline.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sign every terminal record with this key.
    pub fn signing_key(mut self, key: SigningKey) -> Self {
        self.signing_key = Some(key);
        self
    }

    /// Build the pipeline.
    pub fn build(self) -> Result<Chronicle> {
        let ledger: Arc<dyn Ledger> = match self.ledger {
            Some(LedgerChoice::Explicit(ledger)) => ledger,
            Some(LedgerChoice::Memory) => Arc::new(MemoryLedger::new()),
            Some(LedgerChoice::File(path)) => {
                Arc::new(FileLedger::with_durability(path, self.durability)?)
            }
            None => {
                return Err(Error::Config(
                    "choose a ledger backend: .memory(), .file(path), or .ledger(..)".into(),
                ))
            }
        };
        let backend = self
            .backend
            .ok_or_else(|| Error::Config("an execution backend is required".into()))?;

        let mut executor = AtomicExecutor::builder().ledger(ledger.clone()).backend(backend);
        if let Some(deadline) = self.deadline {
            executor = executor.deadline(deadline);
        }
        let signed = self.signing_key.is_some();
        if let Some(key) = self.signing_key {
            executor = executor.signing_key(key);
        }
        debug!(
            deadline = ?self.deadline,
            signed,
            "chronicle pipeline ready"
        );

        Ok(Chronicle {
            ledger,
            executor: executor.build()?,
        })
    }
}
