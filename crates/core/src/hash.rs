//! Deterministic content hashing for atomic records.
//!
//! The content hash is the record's identity. It is computed over the
//! record's canonical form: the JSON value of every field except `hash`
//! and `signature`, with object keys in lexicographic order, serialized
//! compactly. `serde_json`'s map type is backed by `BTreeMap`, so key
//! order is guaranteed by the map itself rather than by insertion order.
//!
//! The same bytes in always produce the same digest out, across process
//! restarts and across implementations that agree on the canonical form.

use crate::atomic::Atomic;
use crate::error::Result;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Produce the canonical JSON value of a record, excluding `hash` and
/// `signature`.
pub fn canonical_form(atomic: &Atomic) -> Result<Value> {
    let mut value = serde_json::to_value(atomic)?;
    if let Value::Object(map) = &mut value {
        map.remove("hash");
        map.remove("signature");
    }
    Ok(value)
}

/// Compute the content hash of a record: SHA-256 over the compact
/// serialization of its canonical form, as lowercase hex.
pub fn content_hash(atomic: &Atomic) -> Result<String> {
    let canonical = serde_json::to_string(&canonical_form(atomic)?)?;
    let digest = Sha256::digest(canonical.as_bytes());
    Ok(format!("{:x}", digest))
}

/// Recompute the content hash and compare it to the stored `hash`.
///
/// Never errors: a record with no stored hash, or one that cannot be
/// canonicalized, is simply not verified. `false` means tampering,
/// corruption, or a record that was never hashed.
pub fn verify_hash(atomic: &Atomic) -> bool {
    match (&atomic.hash, content_hash(atomic)) {
        (Some(stored), Ok(computed)) => *stored == computed,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atomic::{Did, Status};
    use serde_json::json;

    fn sample() -> Atomic {
        Atomic::new("noop", Did::new("A", "run")).with_payload(json!({"n": 1}))
    }

    #[test]
    fn hash_is_deterministic() {
        let atomic = sample();
        assert_eq!(
            content_hash(&atomic).unwrap(),
            content_hash(&atomic).unwrap()
        );
    }

    #[test]
    fn hash_is_hex_sha256() {
        let hash = content_hash(&sample()).unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash.to_lowercase());
    }

    #[test]
    fn hash_excludes_hash_and_signature_fields() {
        let mut atomic = sample();
        let before = content_hash(&atomic).unwrap();
        atomic.hash = Some(before.clone());
        atomic.signature = Some("bm90LWEtcmVhbC1zaWc=".into());
        assert_eq!(content_hash(&atomic).unwrap(), before);
    }

    #[test]
    fn any_field_change_changes_hash() {
        let base = sample();
        let base_hash = content_hash(&base).unwrap();

        let mut changed = base.clone();
        changed.payload = json!({"n": 2});
        assert_ne!(content_hash(&changed).unwrap(), base_hash);

        let mut changed = base.clone();
        changed.did.actor = "B".into();
        assert_ne!(content_hash(&changed).unwrap(), base_hash);

        let mut changed = base.clone();
        changed.status = Status::Failed {
            message: "boom".into(),
        };
        assert_ne!(content_hash(&changed).unwrap(), base_hash);

        let mut changed = base.clone();
        changed.prev = Some("0".repeat(64));
        assert_ne!(content_hash(&changed).unwrap(), base_hash);
    }

    #[test]
    fn verify_hash_true_on_match() {
        let mut atomic = sample();
        atomic.hash = Some(content_hash(&atomic).unwrap());
        assert!(verify_hash(&atomic));
    }

    #[test]
    fn verify_hash_false_on_tamper() {
        let mut atomic = sample();
        atomic.hash = Some(content_hash(&atomic).unwrap());
        atomic.payload = json!({"n": 999});
        assert!(!verify_hash(&atomic));
    }

    #[test]
    fn verify_hash_false_without_hash() {
        assert!(!verify_hash(&sample()));
    }
}
