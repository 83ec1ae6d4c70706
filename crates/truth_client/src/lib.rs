#![deny(missing_docs)]
//! A blocking client for the agent.json site truth discovery protocol.
//!
//! Resolves the discovery URL, performs a conditional GET with a bounded
//! timeout, and routes the body through the fail-closed envelope
//! validator in `agent_truth_core`. `Ok(None)` means exactly one thing:
//! the server answered 404 — no agent contract is published there.
//! Security and schema failures are errors, never `None`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use agent_truth_api::{AgentIntent, TruthDocument, TruthError, TruthResult};
use url::Url;

/// A cached conditional-fetch entry.
///
/// Not part of the trust boundary: a forged 304 can only ever replay a
/// previously verified document, because only the server decides whether
/// to answer 304.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The ETag of the response the document arrived in.
    pub etag: String,
    /// The verified document itself.
    pub doc: TruthDocument,
}

/// A caller-supplied cache keyed by resolved discovery URL.
///
/// Safe to share across concurrent fetches; entries are replaced whole,
/// never partially updated.
#[derive(Debug, Default)]
pub struct TruthCache(Mutex<HashMap<String, CacheEntry>>);

impl TruthCache {
    /// Construct an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a clone of the entry for a resolved discovery URL.
    pub fn get(&self, url: &str) -> Option<CacheEntry> {
        self.0.lock().expect("poisoned truth cache").get(url).cloned()
    }

    /// Atomically replace the entry for a resolved discovery URL.
    pub fn set(&self, url: String, entry: CacheEntry) {
        self.0.lock().expect("poisoned truth cache").insert(url, entry);
    }
}

/// Options controlling a single [blocking_fetch] call.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions<'c> {
    /// The intent to declare via `X-Agent-Intent`.
    pub intent: AgentIntent,

    /// A cache enabling conditional requests. The protocol never creates
    /// an implicit one.
    pub cache: Option<&'c TruthCache>,

    /// The bound on the whole network operation. On expiry the call
    /// fails with [TruthError::Timeout]; it never silently falls back to
    /// cached data.
    pub timeout: Duration,
}

impl Default for FetchOptions<'_> {
    fn default() -> Self {
        Self {
            intent: AgentIntent::Discovery,
            cache: None,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Resolve the discovery URL for a site: a path already ending in
/// `agent.json` is kept, anything else gets `/.well-known/agent.json`
/// appended.
pub fn resolve_discovery_url(mut url: Url) -> Url {
    if !url.path().ends_with("agent.json") {
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base}/.well-known/agent.json"));
    }
    url
}

/// Fetch and verify the site truth published at the given URL.
///
/// Returns `Ok(None)` only for a 404. Every other non-success status is
/// a [TruthError::Network]; verification failures surface as
/// [TruthError::SecurityViolation] and are never swallowed.
///
/// Note the `blocking_` prefix. This is a hint to the caller that if the
/// function is used in an async context, it should be treated as a
/// blocking operation.
pub fn blocking_fetch(
    server_url: Url,
    options: FetchOptions<'_>,
) -> TruthResult<Option<TruthDocument>> {
    let url = resolve_discovery_url(server_url);
    let key = url.to_string();

    let cached = options.cache.and_then(|cache| cache.get(&key));

    let agent = ureq::AgentBuilder::new().timeout(options.timeout).build();
    let mut req = agent
        .get(url.as_str())
        .set("Accept", "application/json")
        .set("X-Agent-Intent", options.intent.as_str());
    if let Some(cached) = &cached {
        req = req.set("If-None-Match", &cached.etag);
    }

    match req.call() {
        Ok(res) if res.status() == 304 => match cached {
            Some(cached) => {
                tracing::debug!(url = %key, "truth unchanged, serving cache");
                Ok(Some(cached.doc))
            }
            // We never sent If-None-Match, so a 304 is a protocol error.
            None => Err(TruthError::network(
                "server answered 304 without a conditional request",
            )),
        },
        Ok(res) => {
            let etag = res.header("ETag").map(str::to_string);
            let body = res.into_string().map_err(|err| {
                if err.kind() == std::io::ErrorKind::TimedOut {
                    TruthError::Timeout(options.timeout)
                } else {
                    TruthError::network(format!("reading response body: {err}"))
                }
            })?;

            let decoded = agent_truth_core::decode_truth(body.as_bytes())?;

            if let (Some(cache), Some(etag)) = (options.cache, etag) {
                cache.set(
                    key,
                    CacheEntry {
                        etag,
                        doc: decoded.doc.clone(),
                    },
                );
            }

            Ok(Some(decoded.doc))
        }
        Err(ureq::Error::Status(404, _)) => Ok(None),
        Err(ureq::Error::Status(code, res)) => {
            let detail = res.into_string().unwrap_or_default();
            Err(TruthError::network(format!(
                "discovery request failed with status {code}: {detail}",
            )))
        }
        Err(ureq::Error::Transport(transport)) => {
            if transport.kind() == ureq::ErrorKind::Io
                && transport.to_string().contains("timed out")
            {
                Err(TruthError::Timeout(options.timeout))
            } else {
                Err(TruthError::network(transport))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn resolved(input: &str) -> String {
        resolve_discovery_url(Url::parse(input).unwrap()).to_string()
    }

    #[test]
    fn root_url_gets_well_known_path() {
        assert_eq!(
            "https://example.com/.well-known/agent.json",
            resolved("https://example.com"),
        );
        assert_eq!(
            "https://example.com/.well-known/agent.json",
            resolved("https://example.com/"),
        );
    }

    #[test]
    fn nested_path_gets_well_known_suffix() {
        assert_eq!(
            "https://example.com/shop/.well-known/agent.json",
            resolved("https://example.com/shop/"),
        );
    }

    #[test]
    fn explicit_agent_json_path_kept() {
        assert_eq!(
            "https://example.com/custom/agent.json",
            resolved("https://example.com/custom/agent.json"),
        );
    }

    #[test]
    fn cache_replaces_entries_whole() {
        let cache = TruthCache::new();
        let doc = TruthDocument {
            site_name: "a".into(),
            ..Default::default()
        };
        cache.set(
            "k".into(),
            CacheEntry {
                etag: "\"one\"".into(),
                doc: doc.clone(),
            },
        );
        cache.set(
            "k".into(),
            CacheEntry {
                etag: "\"two\"".into(),
                doc: doc.clone(),
            },
        );
        let entry = cache.get("k").unwrap();
        assert_eq!("\"two\"", entry.etag);
        assert_eq!(doc, entry.doc);
    }
}
