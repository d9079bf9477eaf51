//! The atomic record type and its lifecycle states.
//!
//! An [`Atomic`] is one immutable event record in the ledger, covering a
//! single action's request and outcome. Records are created in `Pending`,
//! owned by the executor while `Running`, and become immutable once a
//! terminal record (`Completed` or `Failed`) is appended to the ledger.
//!
//! ## State machine
//!
//! ```text
//! Pending ──> Running ──> Completed
//!                    └──> Failed
//! ```
//!
//! `Completed` and `Failed` are terminal. No atomic is ever re-appended or
//! mutated after being stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who performed what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Did {
    /// Actor that performed the action
    pub actor: String,
    /// The action performed
    pub action: String,
}

impl Did {
    /// Create a new actor/action pair.
    pub fn new(actor: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            action: action.into(),
        }
    }
}

/// Execution timing for a record.
///
/// `started_at` is set once, when the executor first takes ownership.
/// `completed_at` is populated if and only if the record is terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct When {
    /// When execution began
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When execution reached a terminal state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Execution outcome payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Output {
    /// Result value reported by the execution backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error message, for failed executions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Execution duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Lifecycle status of an atomic.
///
/// This is a closed variant: a completed record cannot carry an error
/// outcome and a pending record cannot carry a terminal message. The
/// wire-level `result` tag is derived via [`Status::outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Status {
    /// Created, not yet picked up by the executor
    Pending,
    /// Owned by the executor; exists only in memory, never appended
    Running {
        /// Progress message
        message: String,
    },
    /// Execution finished successfully
    Completed {
        /// Optional completion message
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Execution failed or timed out
    Failed {
        /// Failure message
        message: String,
    },
}

impl Default for Status {
    fn default() -> Self {
        Status::Pending
    }
}

impl Status {
    /// Whether this state is terminal (`Completed` or `Failed`).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed { .. } | Status::Failed { .. })
    }

    /// The derived result tag: `Ok` for completed, `Error` for failed,
    /// `Undefined` for pending/running.
    pub fn outcome(&self) -> Outcome {
        match self {
            Status::Completed { .. } => Outcome::Ok,
            Status::Failed { .. } => Outcome::Error,
            Status::Pending | Status::Running { .. } => Outcome::Undefined,
        }
    }

    /// Canonical state name, as it appears on the wire.
    pub fn state_name(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Running { .. } => "running",
            Status::Completed { .. } => "completed",
            Status::Failed { .. } => "failed",
        }
    }
}

/// Derived result tag of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Terminal success
    Ok,
    /// Terminal failure
    Error,
    /// Not yet terminal
    Undefined,
}

/// An immutable-once-appended event record.
///
/// The record's identity is its content hash: a deterministic digest over
/// the canonical form of every field except `hash` and `signature` (see
/// [`crate::hash::content_hash`]). `prev` links a terminal record back to
/// the hash of its own pre-execution snapshot, proving the terminal record
/// derives from that exact submitted request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atomic {
    /// What kind of action this record describes
    pub entity_type: String,
    /// Opaque action-specific data
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
    /// Who performed what
    pub did: Did,
    /// Optional subject/owner identifier, used for querying
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub who: Option<String>,
    /// Execution timing
    #[serde(default)]
    pub when: When,
    /// Lifecycle status
    #[serde(default)]
    pub status: Status,
    /// Execution outcome payload
    #[serde(default)]
    pub output: Output,
    /// Content hash (lowercase hex SHA-256), excluding `hash`/`signature`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Hash of this logical atomic's pre-execution snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    /// Optional detached Ed25519 signature over `hash`, base64-encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Atomic {
    /// Create a pending record with no payload.
    pub fn new(entity_type: impl Into<String>, did: Did) -> Self {
        Self {
            entity_type: entity_type.into(),
            payload: Value::Null,
            did,
            who: None,
            when: When::default(),
            status: Status::default(),
            output: Output::default(),
            hash: None,
            prev: None,
            signature: None,
        }
    }

    /// Attach an action-specific payload.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Attach a subject/owner identifier.
    pub fn with_who(mut self, who: impl Into<String>) -> Self {
        self.who = Some(who.into());
        self
    }

    /// Whether the record is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the record matches a subject identifier: true if either
    /// `who` or `did.actor` equals `subject`.
    pub fn concerns(&self, subject: &str) -> bool {
        self.who.as_deref() == Some(subject) || self.did.actor == subject
    }
}
