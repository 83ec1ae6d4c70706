use crate::*;
use agent_truth_test_utils::enable_tracing;

fn test_site() -> SiteConfig {
    let mut site = SiteConfig::new("Test", "A test site");
    site.last_updated = "2025-01-01T00:00:00Z".into();
    site
}

fn start(site: SiteConfig) -> TruthSrv {
    enable_tracing();
    TruthSrv::new(Config::testing(site)).unwrap()
}

fn truth_url(srv: &TruthSrv) -> String {
    format!("http://{:?}/.well-known/agent.json", srv.listen_addrs()[0])
}

#[test]
fn health_ok() {
    let srv = start(test_site());
    let res = ureq::get(&format!("http://{:?}/health", srv.listen_addrs()[0]))
        .call()
        .unwrap();
    assert_eq!(200, res.status());
    assert_eq!("{}", res.into_string().unwrap());
}

#[test]
fn unknown_path_is_404() {
    let srv = start(test_site());
    let err = ureq::get(&format!("http://{:?}/nope", srv.listen_addrs()[0]))
        .call()
        .unwrap_err();
    assert!(matches!(err, ureq::Error::Status(404, _)));
}

#[test]
fn unsigned_body_is_its_own_canonical_form() {
    let srv = start(test_site());
    let body = ureq::get(&truth_url(&srv))
        .call()
        .unwrap()
        .into_string()
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, agent_truth_api::canonicalize(&value));
    assert_eq!("Test", value["site_name"]);
    assert_eq!("1.0", value["schema_version"]);
    // no envelope wrapper in unsigned mode
    assert!(value.get("signature").is_none());
    assert!(value.get("public_key").is_none());
}

#[test]
fn signed_response_is_a_verifiable_envelope() {
    let (private_key, public_key) =
        agent_truth_core::generate_keypair().unwrap();
    let mut site = test_site();
    site.private_key = Some(private_key);
    site.public_key = Some(public_key.clone());
    let srv = start(site);

    let body = ureq::get(&truth_url(&srv))
        .call()
        .unwrap()
        .into_string()
        .unwrap();

    let decoded = agent_truth_core::decode_truth(body.as_bytes()).unwrap();
    assert_eq!("Test", decoded.doc.site_name);
    assert_eq!(
        agent_truth_core::Provenance::Signed { public_key },
        decoded.provenance,
    );
}

#[test]
fn intent_is_reflected() {
    let srv = start(test_site());
    let res = ureq::get(&truth_url(&srv))
        .set("X-Agent-Intent", "audit")
        .call()
        .unwrap();
    assert_eq!(200, res.status());
    assert_eq!(Some("audit"), res.header("X-Agent-Intent-Reflected"));
    assert!(res.header("X-Agent-Warning").is_none());
}

#[test]
fn invalid_intent_defaults_with_warning() {
    let srv = start(test_site());
    let res = ureq::get(&truth_url(&srv))
        .set("X-Agent-Intent", "nonsense")
        .call()
        .unwrap();
    assert_eq!(200, res.status());
    assert_eq!(Some("discovery"), res.header("X-Agent-Intent-Reflected"));
    assert_eq!(Some("invalid intent"), res.header("X-Agent-Warning"));
}

#[test]
fn missing_intent_defaults_without_warning() {
    let srv = start(test_site());
    let res = ureq::get(&truth_url(&srv)).call().unwrap();
    assert_eq!(Some("discovery"), res.header("X-Agent-Intent-Reflected"));
    assert!(res.header("X-Agent-Warning").is_none());
}

#[test]
fn protocol_version_header_is_set() {
    let srv = start(test_site());
    let res = ureq::get(&truth_url(&srv)).call().unwrap();
    assert_eq!(Some("1.0"), res.header("X-Agent-Protocol-Version"));
}

#[test]
fn conditional_request_gets_304() {
    let srv = start(test_site());

    let res = ureq::get(&truth_url(&srv)).call().unwrap();
    let etag = res.header("ETag").unwrap().to_string();
    assert!(etag.starts_with('"') && etag.ends_with('"'));

    let res = ureq::get(&truth_url(&srv))
        .set("If-None-Match", &etag)
        .call()
        .unwrap();
    assert_eq!(304, res.status());
    assert_eq!(Some(etag.as_str()), res.header("ETag"));
    assert_eq!("", res.into_string().unwrap());

    // a stale etag gets a full response again
    let res = ureq::get(&truth_url(&srv))
        .set("If-None-Match", "\"stale\"")
        .call()
        .unwrap();
    assert_eq!(200, res.status());
}

#[test]
fn private_key_without_public_key_is_500() {
    let (private_key, _) = agent_truth_core::generate_keypair().unwrap();
    let mut site = test_site();
    site.private_key = Some(private_key);
    let srv = start(site);

    let err = ureq::get(&truth_url(&srv)).call().unwrap_err();
    match err {
        ureq::Error::Status(500, res) => {
            let body: serde_json::Value =
                serde_json::from_str(&res.into_string().unwrap()).unwrap();
            assert!(body["error"]
                .as_str()
                .unwrap()
                .contains("public_key is required"));
        }
        oth => panic!("expected 500, got {oth:?}"),
    }
}

#[test]
fn unsupported_announced_version_rejected_at_construction() {
    let mut site = test_site();
    site.schema_version = "9.9".into();
    let err = TruthSrv::new(Config::testing(site)).unwrap_err();
    assert!(matches!(
        err,
        agent_truth_api::TruthError::Configuration(_),
    ));
}

#[test]
fn bad_last_updated_rejected_at_construction() {
    let mut site = test_site();
    site.last_updated = "yesterday".into();
    let err = TruthSrv::new(Config::testing(site)).unwrap_err();
    assert!(matches!(
        err,
        agent_truth_api::TruthError::Configuration(_),
    ));
}

#[test]
fn signing_does_not_change_the_etag() {
    let unsigned = start(test_site());
    let res = ureq::get(&truth_url(&unsigned)).call().unwrap();
    let etag_unsigned = res.header("ETag").unwrap().to_string();

    let (private_key, public_key) =
        agent_truth_core::generate_keypair().unwrap();
    let mut site = test_site();
    site.private_key = Some(private_key);
    site.public_key = Some(public_key);
    let signed = start(site);
    let res = ureq::get(&truth_url(&signed)).call().unwrap();

    // the etag identifies the payload, not the wrapper
    assert_eq!(etag_unsigned, res.header("ETag").unwrap());
}
