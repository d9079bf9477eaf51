//! In-memory ledger backend.
//!
//! A degraded/test configuration: records do not survive the process.
//! Everything else about the contract holds, including admission checks
//! and append serialization, so tests exercise the same semantics the
//! durable backend provides.

use crate::contract::{AtomicFilter, Ledger, LedgerStats, ScanOptions, ScanPage};
use crate::error::Result;
use crate::store::RecordStore;
use chronicle_core::Atomic;
use parking_lot::RwLock;
use tracing::trace;

/// Volatile ledger for tests and ephemeral pipelines.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    store: RwLock<RecordStore>,
}

impl MemoryLedger {
    /// Create an empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    /// Whether the ledger holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Ledger for MemoryLedger {
    fn append(&self, atomic: Atomic) -> Result<String> {
        // Write lock serializes admission and insertion; see chain module.
        let (_, hash) = self.store.write().admit(atomic)?;
        trace!(hash = %hash, "appended to memory ledger");
        Ok(hash)
    }

    fn contains(&self, hash: &str) -> Result<bool> {
        Ok(self.store.read().contains(hash))
    }

    fn query(&self, filter: &AtomicFilter) -> Result<Vec<Atomic>> {
        Ok(self.store.read().query(filter))
    }

    fn scan(&self, options: &ScanOptions) -> Result<ScanPage> {
        Ok(self.store.read().scan(options))
    }

    fn stats(&self) -> Result<LedgerStats> {
        Ok(self.store.read().stats())
    }
}
