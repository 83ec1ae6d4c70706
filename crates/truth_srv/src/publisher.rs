//! Builds the discovery responses a [crate::TruthSrv] worker hands back.

use agent_truth_api::{
    canonicalize, AgentIntent, SignedEnvelope, TruthDocument, TruthError,
    TruthResult, ENVELOPE_ALGORITHM, ENVELOPE_VERSION,
};

use crate::{HttpResponse, SiteConfig};

/// The number of base64 hash characters kept in the ETag.
const ETAG_LEN: usize = 16;

/// Pre-computes everything derivable from the immutable site truth: the
/// outbound payload value, its canonical encoding, and the ETag. Signing
/// happens per response, so a signed envelope is always constructed
/// fresh.
pub struct Publisher {
    schema_version: String,
    payload: serde_json::Value,
    canonical: String,
    etag: String,
    private_key: Option<String>,
    public_key: Option<String>,
}

impl Publisher {
    /// Build a publisher from the site config, merging in the configured
    /// version policy and validating the result.
    pub fn new(site: &SiteConfig) -> TruthResult<Self> {
        if !site.supported_versions.contains(&site.schema_version) {
            return Err(TruthError::configuration(format!(
                "announced schema_version {} is not in supported_versions {:?}",
                site.schema_version, site.supported_versions,
            )));
        }

        let doc = TruthDocument {
            site_name: site.site_name.clone(),
            description: site.description.clone(),
            schema_version: site.schema_version.clone(),
            supported_versions: Some(site.supported_versions.clone()),
            last_updated: site.last_updated.clone(),
            endpoints: site.endpoints.clone(),
            constraints: site.constraints.clone(),
            metadata: site.metadata.clone(),
            extra: serde_json::Map::new(),
        };
        let payload = doc.to_value()?;
        // Round-trip through the validator so a config with e.g. a bad
        // last_updated fails at construction, not per request.
        TruthDocument::from_value(payload.clone())
            .map_err(|e| TruthError::configuration(e.to_string()))?;

        let canonical = canonicalize(&payload);
        let etag = compute_etag(&canonical);

        Ok(Self {
            schema_version: site.schema_version.clone(),
            payload,
            canonical,
            etag,
            private_key: site.private_key.clone(),
            public_key: site.public_key.clone(),
        })
    }

    /// The ETag every 200 response of this publisher carries.
    pub fn etag(&self) -> &str {
        &self.etag
    }

    /// Produce the response for a discovery GET.
    pub fn respond(
        &self,
        intent: Option<&str>,
        if_none_match: Option<&str>,
    ) -> HttpResponse {
        let mut headers = vec![(
            "X-Agent-Protocol-Version",
            self.schema_version.clone(),
        )];

        // An invalid intent reflects the discovery default plus a
        // warning; it never rejects the request.
        let (reflected, recognized) = match intent {
            None => (AgentIntent::Discovery, true),
            Some(raw) => match raw.parse::<AgentIntent>() {
                Ok(intent) => (intent, true),
                Err(_) => {
                    tracing::debug!(raw, "unrecognized agent intent");
                    (AgentIntent::Discovery, false)
                }
            },
        };
        headers.push(("X-Agent-Intent-Reflected", reflected.to_string()));
        if !recognized {
            headers.push(("X-Agent-Warning", "invalid intent".to_string()));
        }
        headers.push(("ETag", self.etag.clone()));

        // Pure bandwidth optimization; no envelope work happens for a
        // conditional hit.
        if if_none_match == Some(self.etag.as_str()) {
            return HttpResponse {
                status: 304,
                headers,
                body: Vec::new(),
            };
        }

        match (&self.private_key, &self.public_key) {
            (Some(private_key), Some(public_key)) => {
                match self.signed_body(private_key, public_key) {
                    Ok(body) => HttpResponse {
                        status: 200,
                        headers,
                        body,
                    },
                    Err(err) => error_response(headers, err),
                }
            }
            (Some(_), None) => error_response(
                headers,
                TruthError::configuration(
                    "public_key is required when private_key is set",
                ),
            ),
            // Unsigned mode: the body is the canonical payload itself.
            (None, _) => HttpResponse {
                status: 200,
                headers,
                body: self.canonical.clone().into_bytes(),
            },
        }
    }

    fn signed_body(
        &self,
        private_key: &str,
        public_key: &str,
    ) -> TruthResult<Vec<u8>> {
        let signing = agent_truth_core::crypto::import_private_key(private_key)
            .map_err(|e| TruthError::configuration(e.to_string()))?;
        let envelope = SignedEnvelope {
            version: ENVELOPE_VERSION,
            algorithm: ENVELOPE_ALGORITHM.into(),
            public_key: public_key.into(),
            signature: agent_truth_core::sign(&self.payload, &signing),
            payload: self.payload.clone(),
        };
        serde_json::to_vec(&envelope)
            .map_err(|e| TruthError::configuration(format!("encoding envelope: {e}")))
    }
}

fn error_response(
    headers: Vec<(&'static str, String)>,
    err: TruthError,
) -> HttpResponse {
    tracing::error!(%err, "failed to produce discovery response");
    HttpResponse {
        status: 500,
        headers,
        body: serde_json::to_vec(&serde_json::json!({
            "error": err.to_string(),
        }))
        .unwrap_or_else(|_| b"{\"error\":\"internal\"}".to_vec()),
    }
}

fn compute_etag(canonical: &str) -> String {
    use base64::prelude::*;
    use sha2::Digest;

    let hash = BASE64_STANDARD.encode(sha2::Sha256::digest(canonical.as_bytes()));
    format!("\"{}\"", &hash[..ETAG_LEN])
}
