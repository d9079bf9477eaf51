//! The ledger contract.
//!
//! A ledger is the append-only store of atomics. The storage backend
//! supplies the durable medium; this trait defines the required semantics.
//!
//! ## Contract
//!
//! - Records are append-only: no update, no delete, no re-append.
//! - `append` is the only synchronization point. Appends on overlapping
//!   lineages (same `prev` tip) are serialized; a racing append against an
//!   already-consumed tip fails with `ChainIntegrity` rather than silently
//!   succeeding. Reads run against a snapshot, unsynchronized.
//! - Identical resubmission of an already-stored hash is an idempotent
//!   no-op; the same hash over distinct content is a fatal collision.
//! - Once `append` returns success on a durable backend, the record
//!   survives process restart. An in-memory backend is a degraded/test
//!   configuration, not the default contract.
//!
//! ## Error handling
//!
//! | Condition | Error |
//! |-----------|-------|
//! | Record has no content hash | `InvalidRecord` |
//! | Hash collision on distinct content | `ChainIntegrity` |
//! | `prev` tip already consumed by another record | `ChainIntegrity` |
//! | Backend I/O failure | `Storage` |

use crate::error::Result;
use chronicle_core::{verify, Atomic, Outcome, VerifyingKey};
use serde::{Deserialize, Serialize};

/// Append-only store of atomics.
///
/// Object safe so backends stay interchangeable behind `Arc<dyn Ledger>`.
pub trait Ledger: Send + Sync {
    /// Store a record permanently, returning its content hash.
    ///
    /// The record must already carry its content hash; the hash is the
    /// record's identity and all dedupe/fork checks are defined over it.
    fn append(&self, atomic: Atomic) -> Result<String>;

    /// Whether a record with this content hash is already stored.
    fn contains(&self, hash: &str) -> Result<bool>;

    /// Return all records matching the filter, insertion order preserved.
    fn query(&self, filter: &AtomicFilter) -> Result<Vec<Atomic>>;

    /// Page through all records with cursor metadata.
    fn scan(&self, options: &ScanOptions) -> Result<ScanPage>;

    /// Backend-reported aggregates: count, size, terminal tallies.
    fn stats(&self) -> Result<LedgerStats>;

    /// Audit every stored record with [`chronicle_core::verify`].
    ///
    /// Walks the ledger in insertion order and reports the first record
    /// that fails verification, if any. Signed records require `key`.
    fn verify_chain(&self, key: Option<&VerifyingKey>) -> Result<ChainVerification> {
        let mut position = 0u64;
        let mut cursor = None;
        loop {
            let page = self.scan(&ScanOptions {
                cursor,
                limit: Some(VERIFY_PAGE_SIZE),
            })?;
            for atomic in &page.atomics {
                if !verify(atomic, key) {
                    return Ok(ChainVerification::invalid(
                        page.total,
                        position,
                        format!(
                            "record {} failed verification (hash: {})",
                            position,
                            atomic.hash.as_deref().unwrap_or("<none>")
                        ),
                    ));
                }
                position += 1;
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(ChainVerification::valid(page.total)),
            }
        }
    }
}

const VERIFY_PAGE_SIZE: usize = 256;

/// Filter for [`Ledger::query`].
///
/// All set fields must match (conjunction). `who` matches a record whose
/// `who` **or** `did.actor` equals the given subject.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtomicFilter {
    /// Subject/owner identifier: matches `who` or `did.actor`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub who: Option<String>,
    /// Exact entity type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    /// Exact action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Derived result tag (`Ok`, `Error`, `Undefined`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

impl AtomicFilter {
    /// Filter by subject/owner identifier.
    pub fn by_who(subject: impl Into<String>) -> Self {
        Self {
            who: Some(subject.into()),
            ..Self::default()
        }
    }

    /// Filter by entity type.
    pub fn by_entity_type(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type.into()),
            ..Self::default()
        }
    }

    /// Whether a record matches this filter.
    pub fn matches(&self, atomic: &Atomic) -> bool {
        if let Some(subject) = &self.who {
            if !atomic.concerns(subject) {
                return false;
            }
        }
        if let Some(entity_type) = &self.entity_type {
            if atomic.entity_type != *entity_type {
                return false;
            }
        }
        if let Some(action) = &self.action {
            if atomic.did.action != *action {
                return false;
            }
        }
        if let Some(outcome) = self.outcome {
            if atomic.status.outcome() != outcome {
                return false;
            }
        }
        true
    }
}

/// Pagination options for [`Ledger::scan`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Resume position from a previous page's `next_cursor`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<u64>,
    /// Maximum records per page; `None` returns everything
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// One page of a [`Ledger::scan`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanPage {
    /// Records in insertion order
    pub atomics: Vec<Atomic>,
    /// Cursor for the next page, `None` when exhausted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<u64>,
    /// Total records in the ledger at scan time
    pub total: u64,
}

/// Backend-reported aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    /// Total stored records
    pub count: u64,
    /// Serialized size of all records, in bytes
    pub size_bytes: u64,
    /// Records with a `Completed` status
    pub completed: u64,
    /// Records with a `Failed` status
    pub failed: u64,
}

/// Result of a full-ledger audit.
///
/// Returned by [`Ledger::verify_chain`] to report the integrity status of
/// every stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainVerification {
    /// Whether every record verified
    pub is_valid: bool,
    /// Total records audited
    pub length: u64,
    /// Position of the first invalid record (if any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_invalid: Option<u64>,
    /// Error description (if any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChainVerification {
    /// A fully valid audit over `length` records.
    pub fn valid(length: u64) -> Self {
        Self {
            is_valid: true,
            length,
            first_invalid: None,
            error: None,
        }
    }

    /// An audit that found its first invalid record at `first_invalid`.
    pub fn invalid(length: u64, first_invalid: u64, error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            length,
            first_invalid: Some(first_invalid),
            error: Some(error.into()),
        }
    }
}
