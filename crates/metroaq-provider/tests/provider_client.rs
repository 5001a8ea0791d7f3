//! Integration tests for `ProviderClient` against a local `wiremock` server.
//!
//! Covers dataset fetch status handling and the two-tier recompute trigger
//! fallback. No real network traffic is made.

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use metroaq_provider::client::PrimaryTrigger;
use metroaq_provider::{ProviderClient, ProviderError, TriggerPath};

fn client_for(server: &MockServer, primary: Option<PrimaryTrigger>) -> ProviderClient {
    ProviderClient::new(&server.uri(), 5, "metroaq-test/0.1", primary, 2)
        .expect("failed to build test ProviderClient")
}

#[tokio::test]
async fn fetch_dataset_returns_raw_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/map/data"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(&json!({ "stations": [], "summary": null })),
        )
        .mount(&server)
        .await;

    let value = client_for(&server, None).fetch_dataset().await.unwrap();
    assert!(value.get("stations").is_some());
}

#[tokio::test]
async fn fetch_dataset_non_2xx_is_unexpected_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/map/data"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server, None).fetch_dataset().await.unwrap_err();
    assert!(
        matches!(err, ProviderError::UnexpectedStatus { status: 503, .. }),
        "expected UnexpectedStatus(503), got: {err:?}"
    );
}

#[tokio::test]
async fn fetch_dataset_invalid_json_is_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/map/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server, None).fetch_dataset().await.unwrap_err();
    assert!(
        matches!(err, ProviderError::Deserialize { .. }),
        "expected Deserialize, got: {err:?}"
    );
}

#[tokio::test]
async fn trigger_uses_primary_with_bearer_header_when_it_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/edge/recompute"))
        .and(header("authorization", "Bearer sekrit"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let primary = PrimaryTrigger {
        url: format!("{}/edge/recompute", server.uri()),
        token: "sekrit".to_owned(),
    };
    let path_taken = client_for(&server, Some(primary))
        .trigger_recompute()
        .await
        .unwrap();
    assert_eq!(path_taken, TriggerPath::Primary);
}

#[tokio::test]
async fn trigger_falls_back_to_secondary_on_primary_non_2xx() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/edge/recompute"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/map/recompute"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let primary = PrimaryTrigger {
        url: format!("{}/edge/recompute", server.uri()),
        token: "sekrit".to_owned(),
    };
    let path_taken = client_for(&server, Some(primary))
        .trigger_recompute()
        .await
        .unwrap();
    assert_eq!(path_taken, TriggerPath::Secondary);
}

#[tokio::test]
async fn trigger_falls_back_to_secondary_on_primary_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/map/recompute"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    // Port 1 is never listening; the primary call fails at connect time.
    let primary = PrimaryTrigger {
        url: "http://127.0.0.1:1/edge/recompute".to_owned(),
        token: "sekrit".to_owned(),
    };
    let path_taken = client_for(&server, Some(primary))
        .trigger_recompute()
        .await
        .unwrap();
    assert_eq!(path_taken, TriggerPath::Secondary);
}

#[tokio::test]
async fn trigger_unconfigured_primary_goes_straight_to_secondary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/map/recompute"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let path_taken = client_for(&server, None).trigger_recompute().await.unwrap();
    assert_eq!(path_taken, TriggerPath::Secondary);
}

#[tokio::test]
async fn trigger_fails_only_when_both_paths_fail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/edge/recompute"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/map/recompute"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let primary = PrimaryTrigger {
        url: format!("{}/edge/recompute", server.uri()),
        token: "sekrit".to_owned(),
    };
    let err = client_for(&server, Some(primary))
        .trigger_recompute()
        .await
        .unwrap_err();
    assert!(
        matches!(err, ProviderError::TriggerFailed { .. }),
        "expected TriggerFailed, got: {err:?}"
    );
}
