//! Append admission: hash identity and fork prevention.
//!
//! Every backend runs the same admission checks before storing a record.
//! The checks must be evaluated and applied under one write lock so a
//! racing append cannot validate against a tip that another append is
//! about to consume (the same TOCTOU window the engine's commit lock
//! closes: validate and apply must be atomic).

use crate::error::{LedgerError, Result};
use chronicle_core::{canonical_form, Atomic};
use std::collections::HashMap;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    /// New record; store it and index it.
    Fresh,
    /// Identical resubmission of a stored record; no-op success.
    Duplicate,
}

/// In-memory admission index over a backend's stored records.
///
/// Tracks record identity (`hash`) and consumed chain tips (`prev`).
/// Backends keep this alongside their record storage and consult it with
/// their write lock held.
#[derive(Debug, Default)]
pub(crate) struct ChainIndex {
    /// hash -> position in the backend's record order
    by_hash: HashMap<String, usize>,
    /// consumed prev tip -> hash of the record that consumed it
    consumed: HashMap<String, String>,
}

impl ChainIndex {
    /// Run the admission checks for `atomic` against the stored records.
    ///
    /// `records` is the backend's insertion-ordered store, used to compare
    /// content on a hash hit. Errors:
    /// - `InvalidRecord` when the record carries no hash
    /// - `ChainIntegrity` on a hash collision over distinct content
    /// - `ChainIntegrity` when `prev` was already consumed by another record
    pub(crate) fn admit(&self, atomic: &Atomic, records: &[Atomic]) -> Result<Admission> {
        let hash = atomic
            .hash
            .as_deref()
            .ok_or_else(|| LedgerError::InvalidRecord("record has no content hash".into()))?;

        if let Some(&position) = self.by_hash.get(hash) {
            let stored = &records[position];
            // Compare canonical forms: identity is content, not signature.
            let same = canonical_form(stored)? == canonical_form(atomic)?;
            if same {
                return Ok(Admission::Duplicate);
            }
            return Err(LedgerError::ChainIntegrity(format!(
                "hash collision on distinct content: {}",
                hash
            )));
        }

        if let Some(prev) = atomic.prev.as_deref() {
            if let Some(winner) = self.consumed.get(prev) {
                return Err(LedgerError::ChainIntegrity(format!(
                    "stale tip: prev {} already consumed by {}",
                    prev, winner
                )));
            }
        }

        Ok(Admission::Fresh)
    }

    /// Whether a record with this hash is indexed.
    pub(crate) fn contains(&self, hash: &str) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// Index a freshly admitted record stored at `position`.
    pub(crate) fn record(&mut self, atomic: &Atomic, position: usize) {
        if let Some(hash) = &atomic.hash {
            self.by_hash.insert(hash.clone(), position);
            if let Some(prev) = &atomic.prev {
                self.consumed.insert(prev.clone(), hash.clone());
            }
        }
    }
}
