//! Bulk export/import round trips.
//!
//! Export then import yields a ledger with an identical record set and
//! identical verification results for every record; re-importing an
//! already-present record is a no-op, not an error.

use chronicle::prelude::*;
use chronicle_executor::BackendError;
use ed25519_dalek::SigningKey;
use serde_json::json;
use std::sync::Arc;

fn populated_pipeline() -> Chronicle {
    let backend: Arc<dyn ExecutionBackend> = Arc::new(FnBackend::new(|a: &Atomic| {
        if a.entity_type == "doomed" {
            Err(BackendError::Fault("boom".into()))
        } else {
            Ok(ExecutionResult::success(a.payload.clone()))
        }
    }));
    let chronicle = Chronicle::builder().memory().backend(backend).build().unwrap();

    for n in 0..4 {
        chronicle
            .process(
                Atomic::new("noop", Did::new(format!("actor-{n}"), "run"))
                    .with_payload(json!({ "n": n })),
            )
            .unwrap();
    }
    chronicle
        .process(Atomic::new("doomed", Did::new("actor-x", "run")))
        .unwrap();
    chronicle
}

fn empty_pipeline() -> Chronicle {
    let backend: Arc<dyn ExecutionBackend> =
        Arc::new(FnBackend::new(|_| Ok(ExecutionResult::success("ok".into()))));
    Chronicle::builder().memory().backend(backend).build().unwrap()
}

#[test]
fn roundtrip_preserves_records_and_verification() {
    let source = populated_pipeline();
    let json = source.export_json().unwrap();

    let target = empty_pipeline();
    let report = target.import_json(&json).unwrap();
    assert_eq!(report.appended, 5);
    assert_eq!(report.skipped, 0);

    let exported_source = source.export().unwrap();
    let exported_target = target.export().unwrap();
    assert_eq!(exported_source, exported_target);

    for (a, b) in exported_source.iter().zip(&exported_target) {
        assert_eq!(verify(a, None), verify(b, None));
        assert!(verify(b, None));
    }
    assert!(target.verify_chain(None).unwrap().is_valid);
}

#[test]
fn reimport_is_idempotent() {
    let chronicle = populated_pipeline();
    let before = chronicle.stats().unwrap();

    let records = chronicle.export().unwrap();
    let report = chronicle.import(records).unwrap();

    assert_eq!(report.appended, 0);
    assert_eq!(report.skipped, before.count);
    assert_eq!(chronicle.stats().unwrap().count, before.count);
}

#[test]
fn import_preserves_chain_relationships() {
    let source = populated_pipeline();
    let target = empty_pipeline();
    target.import(source.export().unwrap()).unwrap();

    for (a, b) in source
        .export()
        .unwrap()
        .iter()
        .zip(&target.export().unwrap())
    {
        assert_eq!(a.prev, b.prev);
        assert_eq!(a.hash, b.hash);
    }
}

#[test]
fn signed_records_survive_the_roundtrip() {
    let key = SigningKey::generate(&mut rand::rngs::OsRng);
    let public = key.verifying_key();
    let backend: Arc<dyn ExecutionBackend> =
        Arc::new(FnBackend::new(|_| Ok(ExecutionResult::success("ok".into()))));
    let source = Chronicle::builder()
        .memory()
        .backend(backend)
        .signing_key(key)
        .build()
        .unwrap();
    source
        .process(Atomic::new("noop", Did::new("A", "run")))
        .unwrap();

    let target = empty_pipeline();
    target.import_json(&source.export_json().unwrap()).unwrap();

    let records = target.export().unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].signature.is_some());
    assert!(verify(&records[0], Some(&public)));
    assert!(target.verify_chain(Some(&public)).unwrap().is_valid);
}

#[test]
fn tampered_import_fails_verification_not_import() {
    // Import is a storage replay, not an audit: a record whose content
    // was altered after hashing still lands, and verify_chain reports it.
    let source = populated_pipeline();
    let mut records = source.export().unwrap();
    records[2].payload = json!({"n": 999});

    let target = empty_pipeline();
    target.import(records).unwrap();

    let verification = target.verify_chain(None).unwrap();
    assert!(!verification.is_valid);
    assert_eq!(verification.first_invalid, Some(2));
}
