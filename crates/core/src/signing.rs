//! Detached Ed25519 signatures over record hashes.
//!
//! Signing is an additive trust upgrade, not a requirement: a record with
//! no signature is valid on hash match alone. The signature covers the
//! content hash's bytes, so signature verification is only meaningful on
//! a record whose hash verifies.

use crate::atomic::Atomic;
use crate::error::{CoreError, Result};
use crate::hash::verify_hash;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

/// Sign a record's stored hash, attaching the base64 signature.
///
/// Fails with [`CoreError::MissingHash`] if the record carries no content
/// hash; compute one first.
pub fn sign(atomic: &mut Atomic, key: &SigningKey) -> Result<()> {
    let hash = atomic.hash.as_deref().ok_or(CoreError::MissingHash)?;
    let signature = key.sign(hash.as_bytes());
    atomic.signature = Some(BASE64.encode(signature.to_bytes()));
    Ok(())
}

/// Check the stored signature against the stored hash.
///
/// Never errors. `false` covers a missing hash, a missing or malformed
/// signature, and a signature that does not verify under `key`.
pub fn verify_signature(atomic: &Atomic, key: &VerifyingKey) -> bool {
    let (Some(hash), Some(signature)) = (&atomic.hash, &atomic.signature) else {
        return false;
    };
    let Ok(sig_bytes) = BASE64.decode(signature) else {
        return false;
    };
    let Ok(sig_arr) = <[u8; 64]>::try_from(sig_bytes.as_slice()) else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_arr);
    key.verify(hash.as_bytes(), &signature).is_ok()
}

/// Full record verification, the entry point for external auditors.
///
/// Returns true only if the content hash matches and, when a signature is
/// present, a public key was supplied and the signature verifies. An
/// unsigned record is valid on hash match alone.
pub fn verify(atomic: &Atomic, key: Option<&VerifyingKey>) -> bool {
    if !verify_hash(atomic) {
        return false;
    }
    match &atomic.signature {
        None => true,
        Some(_) => match key {
            Some(key) => verify_signature(atomic, key),
            None => false,
        },
    }
}

/// Decode a verifying key from its raw 32 bytes.
pub fn verifying_key_from_bytes(bytes: &[u8]) -> Result<VerifyingKey> {
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CoreError::InvalidKey("expected 32 bytes".into()))?;
    VerifyingKey::from_bytes(&arr).map_err(|e| CoreError::InvalidKey(e.to_string()))
}
