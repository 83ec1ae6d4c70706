use agent_truth_api::AgentIntent;
use agent_truth_srv::{Config, SiteConfig, TruthSrv};
use agent_truth_test_utils::enable_tracing;
use url::Url;

use agent_truth_client::*;

fn test_site() -> SiteConfig {
    let mut site = SiteConfig::new("integration", "a site under test");
    site.last_updated = "2025-01-01T00:00:00Z".into();
    site
}

fn server_url(srv: &TruthSrv) -> Url {
    Url::parse(&format!("http://{:?}", srv.listen_addrs()[0])).unwrap()
}

#[test]
fn fetch_unsigned_truth() {
    enable_tracing();

    let srv = TruthSrv::new(Config::testing(test_site())).unwrap();

    let doc = blocking_fetch(server_url(&srv), FetchOptions::default())
        .unwrap()
        .unwrap();

    assert_eq!("integration", doc.site_name);
    assert_eq!("a site under test", doc.description);
}

#[test]
fn fetch_signed_truth() {
    enable_tracing();

    let (private_key, public_key) =
        agent_truth_core::generate_keypair().unwrap();
    let mut site = test_site();
    site.private_key = Some(private_key);
    site.public_key = Some(public_key);

    let srv = TruthSrv::new(Config::testing(site)).unwrap();

    // The signed envelope is verified inside the client; a successful
    // return means the signature checked out.
    let doc = blocking_fetch(
        server_url(&srv),
        FetchOptions {
            intent: AgentIntent::Audit,
            ..Default::default()
        },
    )
    .unwrap()
    .unwrap();

    assert_eq!("integration", doc.site_name);
}

#[test]
fn cache_enables_conditional_replay() {
    enable_tracing();

    let srv = TruthSrv::new(Config::testing(test_site())).unwrap();
    let cache = TruthCache::new();

    let first = blocking_fetch(
        server_url(&srv),
        FetchOptions {
            cache: Some(&cache),
            ..Default::default()
        },
    )
    .unwrap()
    .unwrap();

    let key = resolve_discovery_url(server_url(&srv)).to_string();
    let entry = cache.get(&key).expect("first fetch populates the cache");
    assert_eq!(first, entry.doc);

    // The second fetch sends If-None-Match, gets a 304, and serves the
    // cached document.
    let second = blocking_fetch(
        server_url(&srv),
        FetchOptions {
            cache: Some(&cache),
            ..Default::default()
        },
    )
    .unwrap()
    .unwrap();

    assert_eq!(first, second);
}

#[test]
fn missing_truth_is_none() {
    enable_tracing();

    let srv = TruthSrv::new(Config::testing(test_site())).unwrap();

    let mut url = server_url(&srv);
    url.set_path("/elsewhere/agent.json");

    let got = blocking_fetch(url, FetchOptions::default()).unwrap();
    assert!(got.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn corrupted_signature_is_a_security_violation() {
    enable_tracing();

    let (private_key, public_key) =
        agent_truth_core::generate_keypair().unwrap();
    let key =
        agent_truth_core::crypto::import_private_key(&private_key).unwrap();

    let payload = serde_json::json!({
        "site_name": "hostile",
        "description": "serves a tampered envelope",
        "schema_version": "1.0",
        "last_updated": "2025-01-01T00:00:00Z",
    });
    let signature = agent_truth_core::sign(&payload, &key);

    // Tamper with the payload after signing.
    let mut tampered = payload.clone();
    tampered["description"] = "something else entirely".into();
    let body = serde_json::json!({
        "version": 1,
        "algorithm": "ed25519",
        "public_key": public_key,
        "signature": signature,
        "payload": tampered,
    })
    .to_string();

    async fn handle_truth(
        axum::extract::State(body): axum::extract::State<String>,
    ) -> axum::response::Response {
        axum::response::IntoResponse::into_response((
            [("content-type", "application/json")],
            body,
        ))
    }

    let app: axum::Router<()> = axum::Router::new()
        .route(
            "/.well-known/agent.json",
            axum::routing::get(handle_truth),
        )
        .with_state(body);

    let h = axum_server::Handle::default();
    let h2 = h.clone();

    let task = tokio::task::spawn(async move {
        axum_server::bind(([127, 0, 0, 1], 0).into())
            .handle(h2)
            .serve(app.into_make_service())
            .await
            .unwrap();
    });

    let addr = h.listening().await.unwrap();
    let url = Url::parse(&format!("http://{addr:?}")).unwrap();

    let err = tokio::task::block_in_place(|| {
        blocking_fetch(url, FetchOptions::default()).unwrap_err()
    });
    assert!(
        matches!(err, agent_truth_api::TruthError::SecurityViolation(_)),
        "unexpected error: {err:?}",
    );

    task.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn partial_envelope_never_downgrades_to_plain() {
    enable_tracing();

    // A public key with no signature marks the response as signed; it
    // must fail closed rather than be read as a plain document.
    let body = serde_json::json!({
        "site_name": "hostile",
        "description": "half an envelope",
        "schema_version": "1.0",
        "last_updated": "2025-01-01T00:00:00Z",
        "public_key": "00".repeat(32),
    })
    .to_string();

    async fn handle_truth(
        axum::extract::State(body): axum::extract::State<String>,
    ) -> axum::response::Response {
        axum::response::IntoResponse::into_response((
            [("content-type", "application/json")],
            body,
        ))
    }

    let app: axum::Router<()> = axum::Router::new()
        .route(
            "/.well-known/agent.json",
            axum::routing::get(handle_truth),
        )
        .with_state(body);

    let h = axum_server::Handle::default();
    let h2 = h.clone();

    let task = tokio::task::spawn(async move {
        axum_server::bind(([127, 0, 0, 1], 0).into())
            .handle(h2)
            .serve(app.into_make_service())
            .await
            .unwrap();
    });

    let addr = h.listening().await.unwrap();
    let url = Url::parse(&format!("http://{addr:?}")).unwrap();

    let err = tokio::task::block_in_place(|| {
        blocking_fetch(url, FetchOptions::default()).unwrap_err()
    });
    assert!(
        matches!(err, agent_truth_api::TruthError::SecurityViolation(_)),
        "unexpected error: {err:?}",
    );

    task.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_server_times_out() {
    enable_tracing();

    async fn handle_truth() -> axum::response::Response {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        axum::response::IntoResponse::into_response("late")
    }

    let app: axum::Router<()> = axum::Router::new().route(
        "/.well-known/agent.json",
        axum::routing::get(handle_truth),
    );

    let h = axum_server::Handle::default();
    let h2 = h.clone();

    let task = tokio::task::spawn(async move {
        axum_server::bind(([127, 0, 0, 1], 0).into())
            .handle(h2)
            .serve(app.into_make_service())
            .await
            .unwrap();
    });

    let addr = h.listening().await.unwrap();
    let url = Url::parse(&format!("http://{addr:?}")).unwrap();

    let err = tokio::task::block_in_place(|| {
        blocking_fetch(
            url,
            FetchOptions {
                timeout: std::time::Duration::from_millis(200),
                ..Default::default()
            },
        )
        .unwrap_err()
    });
    assert!(
        matches!(err, agent_truth_api::TruthError::Timeout(_)),
        "unexpected error: {err:?}",
    );

    task.abort();
}
