//! Bulk export and import.
//!
//! The entire ledger serializes as one ordered JSON array of records.
//! Import replays each record through `append` in its original order,
//! preserving chain relationships. Re-importing an already-present record
//! is a no-op, counted in the report rather than raised as an error.

use crate::contract::{Ledger, ScanOptions};
use crate::error::Result;
use chronicle_core::Atomic;
use tracing::debug;

/// Outcome tallies for an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Records newly appended
    pub appended: u64,
    /// Records already present (idempotent no-ops)
    pub skipped: u64,
}

/// Export every record, in insertion order.
pub fn export(ledger: &dyn Ledger) -> Result<Vec<Atomic>> {
    let mut records = Vec::new();
    let mut cursor = None;
    loop {
        let page = ledger.scan(&ScanOptions {
            cursor,
            limit: Some(EXPORT_PAGE_SIZE),
        })?;
        records.extend(page.atomics);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => return Ok(records),
        }
    }
}

const EXPORT_PAGE_SIZE: usize = 256;

/// Export the ledger as a JSON array.
pub fn export_json(ledger: &dyn Ledger) -> Result<String> {
    Ok(serde_json::to_string(&export(ledger)?)?)
}

/// Replay records through `append` in order.
///
/// Chain-integrity and storage failures propagate; duplicates do not.
pub fn import(
    ledger: &dyn Ledger,
    records: impl IntoIterator<Item = Atomic>,
) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    for atomic in records {
        let already_present = match atomic.hash.as_deref() {
            Some(hash) => ledger.contains(hash)?,
            None => false,
        };
        ledger.append(atomic)?;
        if already_present {
            report.skipped += 1;
        } else {
            report.appended += 1;
        }
    }
    debug!(
        appended = report.appended,
        skipped = report.skipped,
        "import complete"
    );
    Ok(report)
}

/// Import from a JSON array produced by [`export_json`].
pub fn import_json(ledger: &dyn Ledger, json: &str) -> Result<ImportReport> {
    let records: Vec<Atomic> = serde_json::from_str(json)?;
    import(ledger, records)
}
