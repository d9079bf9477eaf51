//! The atomic executor: pending → running → terminal, with a guaranteed
//! ledger append.
//!
//! ## Processing sequence
//!
//! ```text
//! 1. stamp started_at (only if unset) and mark Running   [in memory only]
//! 2. capture the pre-execution hash (existing, or freshly computed)
//! 3. invoke the execution backend, measuring elapsed time
//! 4. finalize: both the result arm and the fault arm converge on one
//!    terminal record (Completed | Failed)
//! 5. stamp completed_at, set prev, compute the terminal hash, sign
//! 6. append to the ledger                                 [exactly once]
//! ```
//!
//! Execution failures are data: they land inside the terminal record and
//! never surface as errors from [`AtomicExecutor::process`]. Only ledger
//! boundary failures (chain integrity, storage) propagate, because the
//! caller must know its record did not land.

use crate::backend::{BackendError, DeadlineBackend, ExecutionBackend, ExecutionOutcome, ExecutionResult};
use chronicle_core::{content_hash, sign, Atomic, CoreError, SigningKey, Status};
use chronicle_ledger::{Ledger, LedgerError};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the executor's ledger boundary.
///
/// Nothing execution-related appears here; a failed or timed-out
/// execution still resolves to a terminal atomic.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The terminal record could not be appended
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The terminal record could not be hashed or signed
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The submitted atomic was already terminal; states only move
    /// forward and stored records are never re-executed
    #[error("atomic is already terminal ({0})")]
    AlreadyTerminal(&'static str),

    /// The executor was built without a required dependency
    #[error("executor misconfigured: {0}")]
    Config(String),
}

/// Result type for executor operations.
pub type Result<T> = std::result::Result<T, ExecutorError>;

/// Orchestrates one atomic's state transitions and its single append.
///
/// Dependencies are injected explicitly: the executor holds the ledger
/// and backend it was built with, never a global.
pub struct AtomicExecutor {
    ledger: Arc<dyn Ledger>,
    backend: Arc<dyn ExecutionBackend>,
    signing_key: Option<SigningKey>,
}

impl AtomicExecutor {
    /// Create an executor over a ledger and an execution backend.
    pub fn new(ledger: Arc<dyn Ledger>, backend: Arc<dyn ExecutionBackend>) -> Self {
        Self {
            ledger,
            backend,
            signing_key: None,
        }
    }

    /// Builder for optional configuration.
    pub fn builder() -> AtomicExecutorBuilder {
        AtomicExecutorBuilder::default()
    }

    /// Process one atomic to a terminal record and append it.
    ///
    /// Always returns the terminal atomic (also the one just appended)
    /// unless the ledger append itself fails. The atomic may arrive with
    /// or without `status`/`hash`; both default sensibly.
    pub fn process(&self, mut atomic: Atomic) -> Result<Atomic> {
        if atomic.is_terminal() {
            return Err(ExecutorError::AlreadyTerminal(atomic.status.state_name()));
        }

        // Idempotent on retry: never overwrite an existing start stamp.
        if atomic.when.started_at.is_none() {
            atomic.when.started_at = Some(Utc::now());
        }

        // The pre-execution snapshot's hash becomes the terminal record's
        // prev pointer. Captured before the running transition; the
        // running state never participates in hashing.
        let pre_hash = match &atomic.hash {
            Some(hash) => hash.clone(),
            None => content_hash(&atomic)?,
        };

        atomic.status = Status::Running {
            message: "Processing...".into(),
        };
        debug!(entity_type = %atomic.entity_type, actor = %atomic.did.actor, "executing atomic");

        let started = Instant::now();
        let execution = self.backend.execute(&atomic);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let mut terminal = finalize(atomic, execution, elapsed_ms);
        terminal.when.completed_at = Some(Utc::now());
        terminal.prev = Some(pre_hash);
        terminal.hash = Some(content_hash(&terminal)?);
        if let Some(key) = &self.signing_key {
            sign(&mut terminal, key)?;
        }

        self.ledger.append(terminal.clone())?;
        Ok(terminal)
    }
}

/// Converge every execution path onto one terminal record.
///
/// This is the single finalizer both arms feed: a reported result maps to
/// `Completed`/`Failed` by outcome, and a backend fault maps to `Failed`
/// with the fault captured as data.
fn finalize(
    mut atomic: Atomic,
    execution: std::result::Result<ExecutionResult, BackendError>,
    elapsed_ms: u64,
) -> Atomic {
    match execution {
        Ok(result) => {
            atomic.output.duration_ms = Some(result.duration_ms.unwrap_or(elapsed_ms));
            atomic.output.result = result.output;
            atomic.output.error = result.error.clone();
            atomic.status = match result.outcome {
                ExecutionOutcome::Success => Status::Completed { message: None },
                ExecutionOutcome::Error => Status::Failed {
                    message: result
                        .error
                        .unwrap_or_else(|| "execution reported an error".into()),
                },
            };
        }
        Err(fault) => {
            let message = fault.to_string();
            warn!(error = %message, "execution backend fault");
            atomic.output.duration_ms = Some(elapsed_ms);
            atomic.output.result = None;
            atomic.output.error = Some(message.clone());
            atomic.status = Status::Failed { message };
        }
    }
    atomic
}

/// Builder for [`AtomicExecutor`].
#[derive(Default)]
pub struct AtomicExecutorBuilder {
    ledger: Option<Arc<dyn Ledger>>,
    backend: Option<Arc<dyn ExecutionBackend>>,
    deadline: Option<Duration>,
    signing_key: Option<SigningKey>,
}

impl AtomicExecutorBuilder {
    /// The ledger terminal records are appended to (required).
    pub fn ledger(mut self, ledger: Arc<dyn Ledger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// The execution backend (required).
    pub fn backend(mut self, backend: Arc<dyn ExecutionBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Bound every backend invocation to a deadline.
    ///
    /// Expiry follows the normal failure path: the atomic still lands as
    /// a terminal `failed` record.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sign every terminal record with this key.
    pub fn signing_key(mut self, key: SigningKey) -> Self {
        self.signing_key = Some(key);
        self
    }

    /// Build the executor.
    ///
    /// Fails with [`ExecutorError::Config`] if the ledger or backend was
    /// not provided; both are required dependencies, injected explicitly.
    pub fn build(self) -> Result<AtomicExecutor> {
        let ledger = self
            .ledger
            .ok_or_else(|| ExecutorError::Config("a ledger is required".into()))?;
        let mut backend = self
            .backend
            .ok_or_else(|| ExecutorError::Config("an execution backend is required".into()))?;
        if let Some(deadline) = self.deadline {
            backend = Arc::new(DeadlineBackend::new(backend, deadline));
        }
        Ok(AtomicExecutor {
            ledger,
            backend,
            signing_key: self.signing_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FnBackend;
    use chronicle_core::{verify_hash, Did, Outcome};
    use chronicle_ledger::MemoryLedger;
    use serde_json::json;

    fn submit() -> Atomic {
        Atomic::new("noop", Did::new("A", "run")).with_payload(json!({"n": 1}))
    }

    fn executor_with(
        backend: Arc<dyn ExecutionBackend>,
    ) -> (Arc<MemoryLedger>, AtomicExecutor) {
        let ledger = Arc::new(MemoryLedger::new());
        let executor = AtomicExecutor::new(ledger.clone(), backend);
        (ledger, executor)
    }

    #[test]
    fn success_path_produces_completed_record() {
        let backend = Arc::new(FnBackend::new(|_| Ok(ExecutionResult::success("ok".into()))));
        let (ledger, executor) = executor_with(backend);

        let terminal = executor.process(submit()).unwrap();

        assert!(matches!(terminal.status, Status::Completed { .. }));
        assert_eq!(terminal.status.outcome(), Outcome::Ok);
        assert_eq!(terminal.output.result, Some("ok".into()));
        assert!(terminal.hash.is_some());
        assert!(terminal.prev.is_some());
        assert!(terminal.when.started_at.is_some());
        assert!(terminal.when.completed_at.is_some());
        assert!(verify_hash(&terminal));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn backend_fault_produces_failed_record_still_appended() {
        let backend = Arc::new(FnBackend::new(|_| -> std::result::Result<ExecutionResult, BackendError> {
            Err(BackendError::Fault("boom".into()))
        }));
        let (ledger, executor) = executor_with(backend);

        let terminal = executor.process(submit()).unwrap();

        assert!(matches!(terminal.status, Status::Failed { .. }));
        assert_eq!(terminal.output.error.as_deref(), Some("backend fault: boom"));
        assert!(terminal.output.duration_ms.is_some());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn expected_error_outcome_maps_to_failed() {
        let backend = Arc::new(FnBackend::new(|_| Ok(ExecutionResult::error("bad input"))));
        let (ledger, executor) = executor_with(backend);

        let terminal = executor.process(submit()).unwrap();

        assert_eq!(terminal.status.outcome(), Outcome::Error);
        assert_eq!(terminal.output.error.as_deref(), Some("bad input"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn backend_duration_takes_precedence() {
        let backend = Arc::new(FnBackend::new(|_| {
            Ok(ExecutionResult::success("ok".into()).with_duration_ms(1234))
        }));
        let (_, executor) = executor_with(backend);

        let terminal = executor.process(submit()).unwrap();
        assert_eq!(terminal.output.duration_ms, Some(1234));
    }

    #[test]
    fn prev_points_at_pre_execution_hash() {
        let backend = Arc::new(FnBackend::new(|_| Ok(ExecutionResult::success("ok".into()))));
        let (_, executor) = executor_with(backend);

        let submitted = submit();
        let terminal = executor.process(submitted.clone()).unwrap();

        // Recompute the submitted snapshot's hash the way the executor
        // does: started_at stamped, still pending.
        let mut snapshot = submitted;
        snapshot.when.started_at = terminal.when.started_at;
        let expected = content_hash(&snapshot).unwrap();
        assert_eq!(terminal.prev.as_deref(), Some(expected.as_str()));
        assert_ne!(terminal.prev, terminal.hash);
    }

    #[test]
    fn caller_supplied_hash_becomes_prev() {
        let backend = Arc::new(FnBackend::new(|_| Ok(ExecutionResult::success("ok".into()))));
        let (_, executor) = executor_with(backend);

        let mut submitted = submit();
        submitted.hash = Some(content_hash(&submitted).unwrap());
        let supplied = submitted.hash.clone();

        let terminal = executor.process(submitted).unwrap();
        assert_eq!(terminal.prev, supplied);
        assert_ne!(terminal.hash, supplied);
        assert!(verify_hash(&terminal));
    }

    #[test]
    fn started_at_not_overwritten_on_retry() {
        let backend = Arc::new(FnBackend::new(|_| Ok(ExecutionResult::success("ok".into()))));
        let (_, executor) = executor_with(backend);

        let mut submitted = submit();
        let original_start = Utc::now() - chrono::Duration::seconds(60);
        submitted.when.started_at = Some(original_start);

        let terminal = executor.process(submitted).unwrap();
        assert_eq!(terminal.when.started_at, Some(original_start));
    }

    #[test]
    fn deadline_expiry_still_appends_failed_record() {
        let backend = Arc::new(FnBackend::new(|_| {
            std::thread::sleep(Duration::from_millis(200));
            Ok(ExecutionResult::success("late".into()))
        }));
        let ledger = Arc::new(MemoryLedger::new());
        let executor = AtomicExecutor::builder()
            .ledger(ledger.clone())
            .backend(backend)
            .deadline(Duration::from_millis(20))
            .build()
            .unwrap();

        let terminal = executor.process(submit()).unwrap();
        assert!(matches!(terminal.status, Status::Failed { .. }));
        assert!(terminal
            .output
            .error
            .as_deref()
            .unwrap()
            .contains("timed out"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn terminal_submission_is_rejected() {
        let backend = Arc::new(FnBackend::new(|_| Ok(ExecutionResult::success("ok".into()))));
        let (ledger, executor) = executor_with(backend);

        let terminal = executor.process(submit()).unwrap();
        let err = executor.process(terminal).unwrap_err();
        assert!(matches!(err, ExecutorError::AlreadyTerminal(_)));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn signed_terminal_record_verifies() {
        let key = SigningKey::generate(&mut rand::rngs::OsRng);
        let public = key.verifying_key();
        let backend = Arc::new(FnBackend::new(|_| Ok(ExecutionResult::success("ok".into()))));
        let ledger = Arc::new(MemoryLedger::new());
        let executor = AtomicExecutor::builder()
            .ledger(ledger)
            .backend(backend)
            .signing_key(key)
            .build()
            .unwrap();

        let terminal = executor.process(submit()).unwrap();
        assert!(terminal.signature.is_some());
        assert!(chronicle_core::verify(&terminal, Some(&public)));
    }
}
