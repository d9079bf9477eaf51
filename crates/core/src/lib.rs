//! Core types for the Chronicle ledger.
//!
//! This crate defines the data model and the integrity primitives:
//! - [`Atomic`]: one immutable event record, identified by its content hash
//! - [`hash`]: deterministic canonical-form hashing
//! - [`signing`]: optional detached Ed25519 signatures over the hash

#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod hash;
pub mod signing;

pub use atomic::{Atomic, Did, Outcome, Output, Status, When};
pub use error::{CoreError, Result};
pub use hash::{canonical_form, content_hash, verify_hash};
pub use signing::{sign, verify, verify_signature, verifying_key_from_bytes};

// Key types are part of the public signing surface.
pub use ed25519_dalek::{SigningKey, VerifyingKey};
