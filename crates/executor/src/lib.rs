//! Execution pipeline for Chronicle.
//!
//! This crate provides the pluggable [`ExecutionBackend`] capability and
//! the [`AtomicExecutor`], which drives one atomic through
//! `pending → running → terminal` and appends exactly one terminal record
//! to the ledger per invocation: success or failure never escapes
//! without a ledger record.

#![warn(missing_docs)]

pub mod backend;
pub mod executor;

pub use backend::{
    BackendError, DeadlineBackend, DispatchBackend, ExecutionBackend, ExecutionOutcome,
    ExecutionResult, FnBackend,
};
pub use executor::{AtomicExecutor, AtomicExecutorBuilder, ExecutorError, Result};
