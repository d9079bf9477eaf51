//! Append-only ledger for Chronicle.
//!
//! This crate defines the [`Ledger`] contract and two backends:
//! - [`MemoryLedger`]: volatile, for tests and ephemeral pipelines
//! - [`FileLedger`]: durable newline-delimited JSON with crash recovery
//!
//! The [`transfer`] module provides the bulk export/import format.

#![warn(missing_docs)]

mod chain;
mod store;

pub mod contract;
pub mod error;
pub mod file;
pub mod memory;
pub mod transfer;

pub use contract::{
    AtomicFilter, ChainVerification, Ledger, LedgerStats, ScanOptions, ScanPage,
};
pub use error::{LedgerError, Result};
pub use file::{Durability, FileLedger};
pub use memory::MemoryLedger;
pub use transfer::{export, export_json, import, import_json, ImportReport};
