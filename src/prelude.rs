//! Convenience re-exports for common usage.
//!
//! ```ignore
//! use chronicle::prelude::*;
//! ```

pub use crate::{Chronicle, ChronicleBuilder, Error, Result};
pub use chronicle_core::{verify, Atomic, Did, Outcome, Output, Status, When};
pub use chronicle_executor::{
    DispatchBackend, ExecutionBackend, ExecutionOutcome, ExecutionResult, FnBackend,
};
pub use chronicle_ledger::{AtomicFilter, Durability, Ledger, ScanOptions};
