//! config types.

use std::collections::BTreeMap;

use agent_truth_api::{
    Endpoint, DEFAULT_SCHEMA_VERSION, DEFAULT_SUPPORTED_VERSIONS,
};

/// The static site truth a publisher announces, plus the optional signing
/// key material. Everything here is per-instance: two publishers in the
/// same process can announce entirely independent version policies.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// The human-meaningful site name.
    pub site_name: String,

    /// What the site is and does.
    pub description: String,

    /// The schema version announced in outbound documents.
    ///
    /// Must be contained in `supported_versions`; publisher construction
    /// fails otherwise.
    ///
    /// Default: `"1.0"`
    pub schema_version: String,

    /// The schema versions this publisher speaks, newest first.
    ///
    /// Default: `["1.0", "0.1"]`
    pub supported_versions: Vec<String>,

    /// When the truth last changed, RFC3339.
    ///
    /// Default: the time the config was constructed.
    pub last_updated: String,

    /// Action name to endpoint mapping.
    ///
    /// Default: `None`
    pub endpoints: Option<BTreeMap<String, Endpoint>>,

    /// Named capability flags, open-ended.
    ///
    /// Default: `None`
    pub constraints: Option<serde_json::Map<String, serde_json::Value>>,

    /// Open-ended metadata.
    ///
    /// Default: `None`
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,

    /// Hex-encoded Ed25519 private key (raw seed or PKCS#8 DER).
    ///
    /// When set, `public_key` MUST also be set: responses fail with a 500
    /// rather than silently falling back to unsigned mode.
    ///
    /// Default: `None`
    pub private_key: Option<String>,

    /// Hex-encoded raw Ed25519 public key, embedded in every envelope.
    ///
    /// Default: `None`
    pub public_key: Option<String>,
}

impl SiteConfig {
    /// Construct a site config with the protocol defaults filled in.
    pub fn new(site_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            description: description.into(),
            schema_version: DEFAULT_SCHEMA_VERSION.into(),
            supported_versions: DEFAULT_SUPPORTED_VERSIONS
                .iter()
                .map(|v| v.to_string())
                .collect(),
            last_updated: chrono::Utc::now().to_rfc3339(),
            endpoints: None,
            constraints: None,
            metadata: None,
            private_key: None,
            public_key: None,
        }
    }
}

/// Configuration for running a TruthSrv.
#[derive(Debug)]
pub struct Config {
    /// The site truth to publish.
    pub site: SiteConfig,

    /// Worker thread count.
    ///
    /// The responses themselves are cheap to produce, but signing is a
    /// real cryptographic operation per request, so cpu-bound workers
    /// are appropriate.
    ///
    /// Defaults:
    /// - `testing = 2`
    /// - `production = cpu_count`
    pub worker_thread_count: usize,

    /// The address(es) at which to listen.
    ///
    /// Defaults:
    /// - `testing = "[127.0.0.1:0]"`
    /// - `production = "[0.0.0.0:8080, [::]:8080]"`
    pub listen_address_list: Vec<std::net::SocketAddr>,
}

impl Config {
    /// Get a truth_srv config suitable for testing.
    pub fn testing(site: SiteConfig) -> Self {
        Self {
            site,
            worker_thread_count: 2,
            listen_address_list: vec![(std::net::Ipv4Addr::LOCALHOST, 0).into()],
        }
    }

    /// Get a truth_srv config suitable for production.
    ///
    /// TLS is expected to be terminated in front of this server.
    pub fn production(site: SiteConfig) -> Self {
        Self {
            site,
            worker_thread_count: num_cpus::get(),
            listen_address_list: vec![
                (std::net::Ipv4Addr::UNSPECIFIED, 8080).into(),
                (std::net::Ipv6Addr::UNSPECIFIED, 8080).into(),
            ],
        }
    }
}
