//! # Chronicle
//!
//! Append-only, content-addressed action ledger with a guaranteed-terminal
//! executor.
//!
//! Each ledger entry (an *atomic*) records an action, its execution
//! outcome, and timing, chained to the hash of its own pre-execution
//! snapshot so tampering or reordering is detectable. The executor
//! guarantees exactly one terminal record per processing attempt:
//! execution failures become data, never escaped errors.
//!
//! ## Quick Start
//!
//! ```ignore
//! use chronicle::prelude::*;
//! use std::sync::Arc;
//!
//! let backend = Arc::new(FnBackend::new(|_atomic| {
//!     Ok(ExecutionResult::success("ok".into()))
//! }));
//!
//! let chronicle = Chronicle::builder()
//!     .file("./actions.jsonl")
//!     .backend(backend)
//!     .build()?;
//!
//! let terminal = chronicle.process(
//!     Atomic::new("noop", Did::new("A", "run"))
//! )?;
//! assert_eq!(terminal.status.outcome(), Outcome::Ok);
//!
//! // Anyone can audit a record without re-deriving internals:
//! assert!(verify(&terminal, None));
//! ```
//!
//! ## Components
//!
//! - [`chronicle_core`]: the [`Atomic`] record, content hashing, signing
//! - [`chronicle_ledger`]: the append-only [`Ledger`] contract + backends
//! - [`chronicle_executor`]: [`ExecutionBackend`]s and the state machine
//!
//! [`Atomic`]: chronicle_core::Atomic
//! [`Ledger`]: chronicle_ledger::Ledger
//! [`ExecutionBackend`]: chronicle_executor::ExecutionBackend

#![warn(missing_docs)]

mod error;
mod pipeline;

pub mod prelude;

// Re-export main entry points
pub use error::{Error, Result};
pub use pipeline::{Chronicle, ChronicleBuilder};

// Re-export the verification entry point and core types
pub use chronicle_core::{
    content_hash, verify, verify_hash, verify_signature, Atomic, Did, Outcome, Output, Status,
    When,
};
