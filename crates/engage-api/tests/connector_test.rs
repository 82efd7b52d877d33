#![allow(clippy::unwrap_used)]
// Integration tests for the facade: availability-based routing between the
// REST and XML connectors.

use std::sync::Arc;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use engage_api::xml::actions::AddRecipient;
use engage_api::{
    EngageConnector, Error, Operation, RestClient, Route, TokenProvider, TransportConfig,
    XmlClient,
};

async fn xml_client(server: &MockServer) -> XmlClient {
    let base_url = Url::parse(&server.uri()).unwrap();
    XmlClient::new(&base_url, &TransportConfig::default()).unwrap()
}

async fn rest_client(server: &MockServer) -> (Arc<TokenProvider>, RestClient) {
    let base_url = Url::parse(&server.uri()).unwrap();
    let tokens = Arc::new(TokenProvider::new(reqwest::Client::new(), &base_url).unwrap());
    let client =
        RestClient::new(&base_url, &TransportConfig::default(), Arc::clone(&tokens)).unwrap();
    (tokens, client)
}

#[tokio::test]
async fn test_unconfigured_facade_fails_with_configuration_error() {
    let facade = EngageConnector::new();

    let result = facade.route(Operation::AddRecipient).await;
    assert!(
        matches!(result, Err(Error::Configuration { .. })),
        "expected Configuration error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_xml_only_facade_routes_everything_to_xml() {
    let server = MockServer::start().await;
    let facade = EngageConnector::new().with_xml(Arc::new(xml_client(&server).await));

    // operation name is irrelevant: only XML is configured
    for operation in [
        Operation::AddRecipient,
        Operation::ExportList,
        Operation::CreateEvent,
        Operation::GdprAccess,
    ] {
        assert_eq!(facade.route(operation).await.unwrap(), Route::Xml);
    }
}

#[tokio::test]
async fn test_rest_operation_routed_to_xml_fails_as_unavailable() {
    let server = MockServer::start().await;
    let facade = EngageConnector::new().with_xml(Arc::new(xml_client(&server).await));

    // CreateEvent routes to XML (the only connector) which does not define it
    let result = facade.create_event(12, "2024-06-15T10:30:00.000+00:00", &[]).await;
    assert!(
        matches!(result, Err(Error::Configuration { .. })),
        "expected Configuration error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_live_token_routes_rest_operations_to_rest() {
    let server = MockServer::start().await;
    let (tokens, rest) = rest_client(&server).await;
    tokens.set_access_token("tok-1", None).await;

    let facade = EngageConnector::new()
        .with_rest(Arc::new(rest))
        .with_xml(Arc::new(xml_client(&server).await));

    // a REST-defined operation with a live token goes to REST...
    assert_eq!(facade.route(Operation::CreateEvent).await.unwrap(), Route::Rest);
    assert_eq!(facade.route(Operation::GdprErasure).await.unwrap(), Route::Rest);
    // ...while legacy-only operations still go to XML
    assert_eq!(facade.route(Operation::AddRecipient).await.unwrap(), Route::Xml);
    assert_eq!(facade.route(Operation::ExportList).await.unwrap(), Route::Xml);
}

#[tokio::test]
async fn test_rest_without_live_token_falls_back_to_xml() {
    let server = MockServer::start().await;
    let (_tokens, rest) = rest_client(&server).await;

    let facade = EngageConnector::new()
        .with_rest(Arc::new(rest))
        .with_xml(Arc::new(xml_client(&server).await));

    // no token cached: the availability check fails and XML wins
    assert_eq!(facade.route(Operation::CreateEvent).await.unwrap(), Route::Xml);
}

#[tokio::test]
async fn test_rest_only_facade_rejects_legacy_operations() {
    let server = MockServer::start().await;
    let (tokens, rest) = rest_client(&server).await;
    tokens.set_access_token("tok-1", None).await;

    let facade = EngageConnector::new().with_rest(Arc::new(rest));

    assert_eq!(facade.route(Operation::CreateEvent).await.unwrap(), Route::Rest);
    let result = facade.route(Operation::AddRecipient).await;
    assert!(
        matches!(result, Err(Error::Configuration { .. })),
        "expected Configuration error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_facade_delegates_legacy_call_end_to_end() {
    let server = MockServer::start().await;
    let client = xml_client(&server).await;
    client.session().set_session_id("sess-1").await;
    let facade = EngageConnector::new().with_xml(Arc::new(client));

    Mock::given(method("POST"))
        .and(path("/XMLAPI;jsessionid=sess-1"))
        .and(body_string_contains("AddRecipient"))
        .and(body_string_contains("LIST_ID"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<Envelope><Body><RESULT><SUCCESS>TRUE</SUCCESS>\
             <RecipientId>4455</RecipientId></RESULT></Body></Envelope>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let action = AddRecipient::new("18176618").field("Email", "a@example.com");
    let recipient_id = facade.add_recipient(&action).await.unwrap();
    assert_eq!(recipient_id, "4455");
}

#[tokio::test]
async fn test_facade_delegates_rest_call_end_to_end() {
    let server = MockServer::start().await;
    let (tokens, rest) = rest_client(&server).await;
    tokens.set_access_token("tok-1", None).await;
    let facade = EngageConnector::new().with_rest(Arc::new(rest));

    Mock::given(method("POST"))
        .and(path("/rest/events/submission"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "accepted"})))
        .expect(1)
        .mount(&server)
        .await;

    let attrs = vec![("k".to_owned(), "v".to_owned())];
    let result = facade
        .create_event(12, "2024-06-15T10:30:00.000+00:00", &attrs)
        .await
        .unwrap();
    assert_eq!(result["status"], "accepted");
}
