//! The site truth document and signed envelope wire shapes.
//!
//! Both types are plain serde models of the JSON exchanged on the wire.
//! Unknown keys are preserved, not rejected, so documents signed with
//! fields this version does not know about still round-trip (and verify)
//! byte-exactly.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::{TruthError, TruthResult};

/// The current protocol schema version, used as the default announced
/// version when a publisher configuration does not set one.
pub const DEFAULT_SCHEMA_VERSION: &str = "1.0";

/// The schema versions a publisher supports by default.
pub const DEFAULT_SUPPORTED_VERSIONS: &[&str] = &["1.0", "0.1"];

/// The one envelope version this implementation speaks.
pub const ENVELOPE_VERSION: u64 = 1;

/// The one signature algorithm this implementation speaks.
pub const ENVELOPE_ALGORITHM: &str = "ed25519";

/// The HTTP method of an [Action] endpoint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum Method {
    /// HTTP GET. The default.
    #[default]
    #[serde(rename = "GET")]
    Get,
    /// HTTP POST.
    #[serde(rename = "POST")]
    Post,
}

/// The primitive type of an [ActionParameter].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// A JSON string.
    String,
    /// A JSON number.
    Number,
    /// A JSON boolean.
    Boolean,
}

fn default_true() -> bool {
    true
}

/// A single named parameter of an [Action].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ActionParameter {
    /// The parameter's primitive type.
    #[serde(rename = "type")]
    pub param_type: ParamType,

    /// What this parameter means.
    pub description: String,

    /// Whether the parameter must be supplied. Defaults to `true`.
    #[serde(default = "default_true")]
    pub required: bool,
}

/// An actionable endpoint descriptor.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Action {
    /// The actual endpoint URL.
    pub url: String,

    /// The HTTP method to invoke it with. Defaults to GET.
    #[serde(default)]
    pub method: Method,

    /// What this action does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Named parameters this action accepts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, ActionParameter>>,
}

/// A single entry in the `endpoints` mapping: either a bare URL string
/// (the legacy form) or a full [Action] descriptor. The variant is
/// resolved once at parse time; the two forms are never mixed within one
/// entry.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Endpoint {
    /// A bare endpoint URL.
    Url(String),
    /// A full action descriptor.
    Action(Action),
}

/// The authoritative description of a site: the "site truth".
///
/// Constructed once by the publisher from static configuration and
/// immutable thereafter; a client never mutates a received document.
#[derive(
    Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize,
)]
pub struct TruthDocument {
    /// The human-meaningful site name.
    pub site_name: String,

    /// What the site is and does.
    pub description: String,

    /// The announced schema version of this document.
    pub schema_version: String,

    /// The schema versions the publisher can speak, newest first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_versions: Option<Vec<String>>,

    /// When the truth last changed, as an RFC3339 timestamp.
    pub last_updated: String,

    /// Action name to endpoint mapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<BTreeMap<String, Endpoint>>,

    /// Named capability flags, open-ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Map<String, Value>>,

    /// Open-ended metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    /// Any top-level keys this version does not recognize, preserved
    /// verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TruthDocument {
    /// Deserialize and validate a truth document from a parsed JSON value.
    ///
    /// Checks that the required fields are present and well typed, and
    /// that `last_updated` parses as RFC3339. Unknown keys are preserved
    /// in [TruthDocument::extra].
    pub fn from_value(value: Value) -> TruthResult<Self> {
        let doc: Self = serde_json::from_value(value)
            .map_err(|e| TruthError::schema(format!("invalid truth document: {e}")))?;
        chrono::DateTime::parse_from_rfc3339(&doc.last_updated).map_err(|e| {
            TruthError::schema(format!(
                "last_updated is not RFC3339 ({}): {e}",
                doc.last_updated,
            ))
        })?;
        Ok(doc)
    }

    /// Serialize this document to a JSON value, ready for
    /// [canonicalization](crate::canonicalize).
    pub fn to_value(&self) -> TruthResult<Value> {
        serde_json::to_value(self)
            .map_err(|e| TruthError::schema(format!("encoding truth document: {e}")))
    }
}

/// A wrapper proving a [TruthDocument] was produced by the holder of a
/// given Ed25519 private key.
///
/// The payload is kept as a raw JSON value rather than a decoded
/// [TruthDocument] so the signature can be verified over exactly the
/// canonical bytes of what was received, unknown fields included.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SignedEnvelope {
    /// Envelope version. Must be the integer literal `1`.
    pub version: u64,

    /// Signature algorithm. Must be the string `"ed25519"`.
    pub algorithm: String,

    /// Lowercase hex encoding of the raw 32-byte Ed25519 public key.
    pub public_key: String,

    /// Lowercase hex encoding of the 64-byte Ed25519 signature over the
    /// canonical encoding of `payload`.
    pub signature: String,

    /// The truth document this envelope attests to.
    pub payload: Value,
}

impl SignedEnvelope {
    /// Check the envelope's own shape: the version and algorithm
    /// literals, and that the payload is a JSON object. Field-level
    /// payload validation and signature verification are the envelope
    /// validator's job.
    pub fn check_literals(&self) -> TruthResult<()> {
        if self.version != ENVELOPE_VERSION {
            return Err(TruthError::security(format!(
                "unsupported envelope version: {}",
                self.version,
            )));
        }
        if self.algorithm != ENVELOPE_ALGORITHM {
            return Err(TruthError::security(format!(
                "unsupported envelope algorithm: {}",
                self.algorithm,
            )));
        }
        if !self.payload.is_object() {
            return Err(TruthError::security("envelope payload is not an object"));
        }
        Ok(())
    }
}
