//! Shared in-memory record store used by the concrete backends.
//!
//! Both backends answer reads from an insertion-ordered in-memory copy of
//! the ledger (the file backend rebuilds it on open). This module holds
//! that copy plus the admission index, so admission and read semantics are
//! identical across backends.
//!
//! `check` and `insert` are split so a durable backend can order its write
//! between them: check, persist, then index. Both must run under the same
//! write lock; see the chain module on the validate/apply race.

use crate::chain::{Admission, ChainIndex};
use crate::contract::{AtomicFilter, LedgerStats, ScanOptions, ScanPage};
use crate::error::Result;
use chronicle_core::{Atomic, Status};

/// Insertion-ordered records plus the admission index.
#[derive(Debug, Default)]
pub(crate) struct RecordStore {
    records: Vec<Atomic>,
    index: ChainIndex,
    size_bytes: u64,
}

impl RecordStore {
    /// Run the admission checks without mutating the store.
    ///
    /// Returns the admission outcome and the record's hash.
    pub(crate) fn check(&self, atomic: &Atomic) -> Result<(Admission, String)> {
        let admission = self.index.admit(atomic, &self.records)?;
        // admit() guarantees the hash is present past this point.
        let hash = atomic.hash.clone().unwrap_or_default();
        Ok((admission, hash))
    }

    /// Store and index a record that passed `check` as `Fresh`.
    pub(crate) fn insert(&mut self, atomic: Atomic) -> Result<()> {
        self.size_bytes += serde_json::to_vec(&atomic)?.len() as u64;
        self.index.record(&atomic, self.records.len());
        self.records.push(atomic);
        Ok(())
    }

    /// `check` + `insert` in one step, for backends with no durable write.
    pub(crate) fn admit(&mut self, atomic: Atomic) -> Result<(Admission, String)> {
        let (admission, hash) = self.check(&atomic)?;
        if admission == Admission::Fresh {
            self.insert(atomic)?;
        }
        Ok((admission, hash))
    }

    /// Whether a record with this hash is stored.
    pub(crate) fn contains(&self, hash: &str) -> bool {
        self.index.contains(hash)
    }

    pub(crate) fn query(&self, filter: &AtomicFilter) -> Vec<Atomic> {
        self.records
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect()
    }

    pub(crate) fn scan(&self, options: &ScanOptions) -> ScanPage {
        let total = self.records.len() as u64;
        let start = options.cursor.unwrap_or(0).min(total) as usize;
        let end = match options.limit {
            Some(limit) => (start + limit).min(self.records.len()),
            None => self.records.len(),
        };
        let atomics = self.records[start..end].to_vec();
        let next_cursor = if end < self.records.len() {
            Some(end as u64)
        } else {
            None
        };
        ScanPage {
            atomics,
            next_cursor,
            total,
        }
    }

    pub(crate) fn stats(&self) -> LedgerStats {
        let mut completed = 0;
        let mut failed = 0;
        for record in &self.records {
            match record.status {
                Status::Completed { .. } => completed += 1,
                Status::Failed { .. } => failed += 1,
                _ => {}
            }
        }
        LedgerStats {
            count: self.records.len() as u64,
            size_bytes: self.size_bytes,
            completed,
            failed,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}
