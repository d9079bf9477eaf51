//! Concurrent append behavior.
//!
//! Independent lineages proceed in parallel with no lost writes and no
//! cross-contamination of `prev` pointers. Racing appends on the same
//! lineage tip resolve to exactly one winner; the loser surfaces a
//! chain-integrity error instead of silently succeeding.

use chronicle::prelude::*;
use chronicle_executor::{AtomicExecutor, ExecutorError};
use chronicle_ledger::{LedgerError, MemoryLedger};
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

fn echo_backend() -> Arc<dyn ExecutionBackend> {
    Arc::new(FnBackend::new(|a: &Atomic| {
        Ok(ExecutionResult::success(a.payload.clone()))
    }))
}

#[test]
fn independent_lineages_interleave_without_loss() {
    let ledger = Arc::new(MemoryLedger::new());
    let writers = 8;
    let barrier = Arc::new(Barrier::new(writers));

    let handles: Vec<_> = (0..writers)
        .map(|n| {
            let ledger = ledger.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let executor = AtomicExecutor::new(ledger, echo_backend());
                let atomic = Atomic::new("noop", Did::new(format!("actor-{n}"), "run"))
                    .with_payload(json!({ "n": n }));
                barrier.wait();
                executor.process(atomic).unwrap()
            })
        })
        .collect();

    let terminals: Vec<Atomic> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(ledger.len(), writers);

    // Each terminal carries its own lineage: the echoed payload matches
    // the actor, and no two records share a prev pointer.
    let mut prevs = HashSet::new();
    for terminal in &terminals {
        let n = terminal.output.result.as_ref().unwrap()["n"].as_u64().unwrap();
        assert_eq!(terminal.did.actor, format!("actor-{n}"));
        assert!(prevs.insert(terminal.prev.clone().unwrap()));
    }
}

#[test]
fn same_tip_race_has_exactly_one_winner() {
    let ledger = Arc::new(MemoryLedger::new());

    // Identical submitted snapshot on both sides: pre-set started_at so
    // both racers compute the same pre-execution hash. Distinct backend
    // outputs keep the two terminal records distinct.
    let mut submitted = Atomic::new("noop", Did::new("A", "run")).with_payload(json!({"n": 1}));
    submitted.when.started_at = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = ["left", "right"]
        .into_iter()
        .map(|side| {
            let ledger = ledger.clone();
            let barrier = barrier.clone();
            let atomic = submitted.clone();
            thread::spawn(move || {
                let backend: Arc<dyn ExecutionBackend> = Arc::new(FnBackend::new(
                    move |_: &Atomic| Ok(ExecutionResult::success(side.into())),
                ));
                let executor = AtomicExecutor::new(ledger, backend);
                barrier.wait();
                executor.process(atomic)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    let losers = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(ExecutorError::Ledger(LedgerError::ChainIntegrity(_)))
            )
        })
        .count();

    assert_eq!(winners, 1, "exactly one racer must win the tip");
    assert_eq!(losers, 1, "the loser must see a chain-integrity error");
    assert_eq!(ledger.len(), 1);
}

#[test]
fn stale_tip_rejected_sequentially() {
    let ledger = Arc::new(MemoryLedger::new());

    let mut submitted = Atomic::new("noop", Did::new("A", "run")).with_payload(json!({"n": 1}));
    submitted.when.started_at = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());

    let first = AtomicExecutor::new(
        ledger.clone(),
        Arc::new(FnBackend::new(|_| Ok(ExecutionResult::success("first".into())))),
    );
    let second = AtomicExecutor::new(
        ledger.clone(),
        Arc::new(FnBackend::new(|_| Ok(ExecutionResult::success("second".into())))),
    );

    first.process(submitted.clone()).unwrap();
    let err = second.process(submitted).unwrap_err();
    assert!(matches!(
        err,
        ExecutorError::Ledger(LedgerError::ChainIntegrity(_))
    ));
    assert_eq!(ledger.len(), 1);
}

#[test]
fn concurrent_reads_do_not_block_appends() {
    let ledger = Arc::new(MemoryLedger::new());
    let executor = Arc::new(AtomicExecutor::new(ledger.clone(), echo_backend()));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let ledger = ledger.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    let _ = ledger.query(&AtomicFilter::default()).unwrap();
                    let _ = ledger.stats().unwrap();
                }
            })
        })
        .collect();

    for n in 0..20 {
        executor
            .process(
                Atomic::new("noop", Did::new("writer", "run")).with_payload(json!({ "n": n })),
            )
            .unwrap();
    }

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(ledger.len(), 20);
}
