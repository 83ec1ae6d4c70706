//! Ed25519 key handling and signing over canonical bytes.
//!
//! Wire forms: public keys are the raw 32 key bytes, lowercase hex.
//! Private keys are accepted either as a raw 32-byte seed or as a PKCS#8
//! DER document, both lowercase hex; export produces PKCS#8 so keys are
//! interchangeable with webcrypto-based publishers.

use agent_truth_api::{canonicalize, TruthError, TruthResult};
use ed25519_dalek::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

/// Generate a fresh Ed25519 key pair, returned in the protocol's hex wire
/// forms as `(private_key, public_key)`.
pub fn generate_keypair() -> TruthResult<(String, String)> {
    let signing = SigningKey::generate(&mut rand::rngs::OsRng);
    Ok((
        export_private_key(&signing)?,
        export_public_key(&signing.verifying_key()),
    ))
}

/// Import a hex-encoded raw 32-byte Ed25519 public key.
pub fn import_public_key(hex_key: &str) -> TruthResult<VerifyingKey> {
    let bytes = hex::decode(hex_key)
        .map_err(|e| TruthError::key_format(format!("public key hex: {e}")))?;
    let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
        TruthError::key_format(format!(
            "public key must be 32 bytes, got {}",
            b.len(),
        ))
    })?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|e| TruthError::key_format(format!("public key material: {e}")))
}

/// Import a hex-encoded Ed25519 private key: either a raw 32-byte seed or
/// a PKCS#8 DER document.
pub fn import_private_key(hex_key: &str) -> TruthResult<SigningKey> {
    let bytes = hex::decode(hex_key)
        .map_err(|e| TruthError::key_format(format!("private key hex: {e}")))?;
    if let Ok(seed) = <[u8; 32]>::try_from(bytes.as_slice()) {
        return Ok(SigningKey::from_bytes(&seed));
    }
    SigningKey::from_pkcs8_der(&bytes)
        .map_err(|e| TruthError::key_format(format!("private key material: {e}")))
}

/// Export a public key as hex-encoded raw bytes.
pub fn export_public_key(key: &VerifyingKey) -> String {
    hex::encode(key.as_bytes())
}

/// Export a private key as a hex-encoded PKCS#8 DER document.
pub fn export_private_key(key: &SigningKey) -> TruthResult<String> {
    let der = key
        .to_pkcs8_der()
        .map_err(|e| TruthError::key_format(format!("pkcs8 encoding: {e}")))?;
    Ok(hex::encode(der.as_bytes()))
}

/// Sign a payload: canonicalize it and sign the resulting bytes,
/// returning the signature as lowercase hex.
pub fn sign(payload: &serde_json::Value, key: &SigningKey) -> String {
    let canonical = canonicalize(payload);
    hex::encode(key.sign(canonical.as_bytes()).to_bytes())
}

/// Verify a hex signature against the canonical bytes of a payload.
///
/// Never errors: malformed signature hex, wrong-length material, and
/// failed verification all return `false`.
pub fn verify(
    payload: &serde_json::Value,
    signature_hex: &str,
    key: &VerifyingKey,
) -> bool {
    let bytes = match hex::decode(signature_hex) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let bytes: [u8; 64] = match bytes.try_into() {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let signature = Signature::from_bytes(&bytes);
    let canonical = canonicalize(payload);
    key.verify(canonical.as_bytes(), &signature).is_ok()
}
