//! The execution backend capability.
//!
//! A backend performs the action an atomic describes and reports an
//! outcome. Implementations are polymorphic over the single [`execute`]
//! method: a sandboxed interpreter, a domain dispatcher keyed by entity
//! type, or a closure in tests are all interchangeable.
//!
//! ## Contract
//!
//! - Expected failure modes (bad input, runtime error in the payload)
//!   return `Ok` with [`ExecutionOutcome::Error`]; only truly unexpected
//!   backend faults surface as `Err`.
//! - A backend has no ambient access to the executor's or ledger's state
//!   beyond the atomic passed in.
//! - Execution must respect a resource/time boundary; [`DeadlineBackend`]
//!   provides one for backends that cannot enforce their own.
//!
//! [`execute`]: ExecutionBackend::execute

use chronicle_core::Atomic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Whether the backend considers the execution successful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// The action ran to completion
    Success,
    /// The action failed in an expected way
    Error,
}

/// What a backend reports back to the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Success or expected failure
    pub outcome: ExecutionOutcome,
    /// Result value on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Error message on expected failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Backend-measured duration; takes precedence over the executor's
    /// locally measured elapsed time when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ExecutionResult {
    /// A successful execution with an output value.
    pub fn success(output: Value) -> Self {
        Self {
            outcome: ExecutionOutcome::Success,
            output: Some(output),
            error: None,
            duration_ms: None,
        }
    }

    /// An expected failure with an error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            outcome: ExecutionOutcome::Error,
            output: None,
            error: Some(message.into()),
            duration_ms: None,
        }
    }

    /// Attach a backend-measured duration.
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Unexpected backend faults.
///
/// These take the executor's failure path: the atomic still lands in the
/// ledger as a terminal `failed` record.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Execution exceeded the configured deadline
    #[error("execution timed out after {0:?}")]
    Timeout(Duration),

    /// The backend terminated without reporting a result
    #[error("backend fault: {0}")]
    Fault(String),
}

/// The single capability every execution backend provides.
pub trait ExecutionBackend: Send + Sync {
    /// Perform the action the atomic describes and report the outcome.
    fn execute(&self, atomic: &Atomic) -> Result<ExecutionResult, BackendError>;
}

/// Adapter so closures can serve as backends.
///
/// ```
/// use chronicle_executor::backend::{ExecutionResult, FnBackend};
/// let backend = FnBackend::new(|_atomic| Ok(ExecutionResult::success("ok".into())));
/// ```
pub struct FnBackend<F>(F);

impl<F> FnBackend<F>
where
    F: Fn(&Atomic) -> Result<ExecutionResult, BackendError> + Send + Sync,
{
    /// Wrap a closure as an execution backend.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> ExecutionBackend for FnBackend<F>
where
    F: Fn(&Atomic) -> Result<ExecutionResult, BackendError> + Send + Sync,
{
    fn execute(&self, atomic: &Atomic) -> Result<ExecutionResult, BackendError> {
        (self.0)(atomic)
    }
}

/// Domain dispatcher: routes each atomic to a handler registered for its
/// `entity_type`.
///
/// An atomic whose entity type has no handler is an expected failure, not
/// a fault: the executor records a terminal `failed` atomic for it.
#[derive(Default)]
pub struct DispatchBackend {
    handlers: HashMap<String, Arc<dyn ExecutionBackend>>,
}

impl DispatchBackend {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an entity type, replacing any previous one.
    pub fn register(
        mut self,
        entity_type: impl Into<String>,
        handler: Arc<dyn ExecutionBackend>,
    ) -> Self {
        self.handlers.insert(entity_type.into(), handler);
        self
    }

    /// Registered entity types.
    pub fn entity_types(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }
}

impl ExecutionBackend for DispatchBackend {
    fn execute(&self, atomic: &Atomic) -> Result<ExecutionResult, BackendError> {
        match self.handlers.get(&atomic.entity_type) {
            Some(handler) => handler.execute(atomic),
            None => Ok(ExecutionResult::error(format!(
                "no handler registered for entity type '{}'",
                atomic.entity_type
            ))),
        }
    }
}

/// Wraps a backend with a hard time boundary.
///
/// The inner backend runs on a worker thread; if it does not report
/// within the deadline the call fails with [`BackendError::Timeout`].
/// The worker is detached on timeout and its late result is dropped on
/// the closed channel. A panicking inner backend surfaces as a fault.
pub struct DeadlineBackend {
    inner: Arc<dyn ExecutionBackend>,
    deadline: Duration,
}

impl DeadlineBackend {
    /// Bound `inner` to finish within `deadline`.
    pub fn new(inner: Arc<dyn ExecutionBackend>, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    /// The configured deadline.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl ExecutionBackend for DeadlineBackend {
    fn execute(&self, atomic: &Atomic) -> Result<ExecutionResult, BackendError> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let atomic = atomic.clone();
        thread::spawn(move || {
            let _ = tx.send(inner.execute(&atomic));
        });

        match rx.recv_timeout(self.deadline) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(deadline_ms = self.deadline.as_millis() as u64, "execution deadline expired");
                Err(BackendError::Timeout(self.deadline))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(BackendError::Fault(
                "backend terminated without reporting a result".into(),
            )),
        }
    }
}
