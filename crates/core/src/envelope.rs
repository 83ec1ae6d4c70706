//! The client-side fail-closed envelope decision procedure.

use agent_truth_api::{
    SignedEnvelope, TruthDocument, TruthError, TruthResult,
};

use crate::crypto;

/// How a decoded truth document was authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// The document arrived inside a [SignedEnvelope] whose signature
    /// verified under the embedded public key (hex, lowercase).
    Signed {
        /// The hex-encoded public key the signature verified under.
        public_key: String,
    },
    /// The document arrived bare, with no cryptographic guarantee.
    /// Callers whose policy requires authenticity must reject this
    /// themselves.
    Unsigned,
}

/// A truth document that passed the decision procedure.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTruth {
    /// The verified (or accepted-as-plain) document.
    pub doc: TruthDocument,
    /// How it was authenticated.
    pub provenance: Provenance,
}

/// Decode a raw response body into a truth document, failing closed.
///
/// Classification happens first and is irrevocable: if the top-level
/// object contains a `signature` or `public_key` key it is a signed
/// candidate, and every subsequent failure on that path is a terminal
/// [TruthError::SecurityViolation]. A stripped or corrupted envelope is
/// never reinterpreted as a plain document, even when removing the
/// signature fields would leave a schema-valid one. Classification looks
/// only at key presence, never at whether the envelope "looks valid".
pub fn decode_truth(body: &[u8]) -> TruthResult<DecodedTruth> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| TruthError::schema(format!("response is not JSON: {e}")))?;

    let signed_candidate = value
        .as_object()
        .map(|o| o.contains_key("signature") || o.contains_key("public_key"))
        .unwrap_or(false);

    if signed_candidate {
        decode_signed(value)
    } else {
        let doc = TruthDocument::from_value(value).map_err(|e| {
            TruthError::schema(format!(
                "response matches neither signed envelope nor truth document: {e}",
            ))
        })?;
        Ok(DecodedTruth {
            doc,
            provenance: Provenance::Unsigned,
        })
    }
}

fn decode_signed(value: serde_json::Value) -> TruthResult<DecodedTruth> {
    let envelope: SignedEnvelope =
        serde_json::from_value(value).map_err(|e| {
            tracing::debug!(?e, "rejecting malformed signed envelope");
            TruthError::security(format!("malformed signed envelope: {e}"))
        })?;

    envelope.check_literals()?;

    // The payload must already have the truth document shape; a signature
    // over garbage proves nothing useful.
    let doc = TruthDocument::from_value(envelope.payload.clone())
        .map_err(|e| TruthError::security(format!("malformed signed envelope: {e}")))?;

    // Key import failures at this boundary are security violations, not
    // key format errors: the envelope claimed to be signed and cannot
    // make good on it.
    let key = crypto::import_public_key(&envelope.public_key)
        .map_err(|e| TruthError::security(format!("malformed signed envelope: {e}")))?;

    // Verify over the raw received payload value, so unknown payload
    // fields participate in the canonical bytes exactly as sent.
    if !crypto::verify(&envelope.payload, &envelope.signature, &key) {
        tracing::debug!("rejecting envelope with invalid signature");
        return Err(TruthError::security("invalid signature"));
    }

    Ok(DecodedTruth {
        doc,
        provenance: Provenance::Signed {
            public_key: envelope.public_key,
        },
    })
}
