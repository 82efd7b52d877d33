#![allow(clippy::unwrap_used)]
// Integration tests for `RestClient` using wiremock: bearer JSON posts, the
// 401 retry, event preconditions, and the CSV data-subject flow.

use std::sync::Arc;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use engage_api::{Error, OauthCredentials, RestClient, TokenProvider, TransportConfig};

async fn setup() -> (MockServer, Arc<TokenProvider>, RestClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let tokens = Arc::new(
        TokenProvider::with_credentials(
            reqwest::Client::new(),
            &base_url,
            OauthCredentials::new("client-1", "secret-1", "refresh-1"),
        )
        .unwrap(),
    );
    let client =
        RestClient::new(&base_url, &TransportConfig::default(), Arc::clone(&tokens)).unwrap();
    (server, tokens, client)
}

const EVENT_TS: &str = "2024-06-15T10:30:00.000+00:00";

fn event_attrs() -> Vec<(String, String)> {
    vec![("order-id".to_owned(), "A-1001".to_owned())]
}

// ── create_event ────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_event_posts_bearer_json() {
    let (server, tokens, client) = setup().await;
    tokens.set_access_token("tok-1", None).await;

    Mock::given(method("POST"))
        .and(path("/rest/events/submission"))
        .and(header("Authorization", "Bearer tok-1"))
        .and(body_string_contains("eventTypeCode"))
        .and(body_string_contains("order-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "accepted"})))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.create_event(12, EVENT_TS, &event_attrs()).await.unwrap();
    assert_eq!(result["status"], "accepted");
}

#[tokio::test]
async fn test_create_event_rejects_bad_arguments_before_sending() {
    let (_server, tokens, client) = setup().await;
    tokens.set_access_token("tok-1", None).await;

    // no mocks mounted: any network call would fail the test via the error path
    let bad_code = client.create_event(0, EVENT_TS, &event_attrs()).await;
    assert!(matches!(bad_code, Err(Error::Validation { .. })), "got: {bad_code:?}");

    let bad_ts = client
        .create_event(12, "2024-06-15 10:30:00", &event_attrs())
        .await;
    assert!(matches!(bad_ts, Err(Error::Validation { .. })), "got: {bad_ts:?}");

    let no_attrs = client.create_event(12, EVENT_TS, &[]).await;
    assert!(matches!(no_attrs, Err(Error::Validation { .. })), "got: {no_attrs:?}");
}

// ── 401 retry ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_response_invalidates_token_and_retries_once() {
    let (server, _tokens, client) = setup().await;

    // both the initial exchange and the post-401 re-exchange hit the token
    // endpoint
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "expires_in": 3600,
        })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/events/submission"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/events/submission"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "accepted"})))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.create_event(12, EVENT_TS, &event_attrs()).await.unwrap();
    assert_eq!(result["status"], "accepted");
}

#[tokio::test]
async fn test_second_unauthorized_propagates() {
    let (server, _tokens, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "expires_in": 3600,
        })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/events/submission"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .expect(2)
        .mount(&server)
        .await;

    let result = client.create_event(12, EVENT_TS, &event_attrs()).await;
    match result {
        Err(Error::Api { ref message, .. }) => {
            assert!(message.contains("401"), "got: {message}");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

// ── Data-subject CSV flow ───────────────────────────────────────────

#[tokio::test]
async fn test_gdpr_access_uploads_csv_and_polls_fetch_url() {
    let (server, tokens, client) = setup().await;
    tokens.set_access_token("tok-1", None).await;

    let fetch_url = format!("{}/fetch/job-9", server.uri());

    Mock::given(method("POST"))
        .and(path("/rest/databases/123/gdpr_access"))
        .and(header("Content-Type", "text/csv"))
        .and(body_string_contains("Email,a@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "location": fetch_url }
        })))
        .expect(1)
        .mount(&server)
        .await;

    // still running on the first poll, done on the second
    Mock::given(method("GET"))
        .and(path("/fetch/job-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "status": "pending" }
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fetch/job-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "result": [["Email", "a@example.com"]] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rows = vec![vec!["Email".to_owned(), "a@example.com".to_owned()]];
    let body = client.gdpr_access("123", &rows).await.unwrap();
    assert!(body.pointer("/data/status").is_none());
    assert!(body.pointer("/data/result").is_some());
}

#[tokio::test]
async fn test_gdpr_erasure_requires_rows() {
    let (_server, tokens, client) = setup().await;
    tokens.set_access_token("tok-1", None).await;

    let result = client.gdpr_erasure("123", &[]).await;
    assert!(
        matches!(result, Err(Error::Validation { .. })),
        "expected Validation error, got: {result:?}"
    );
}
