use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_database::jendo_api::is_not_found;
use shared_database::{ApiClientError, JendoApiClient};

#[derive(Debug, Deserialize, PartialEq)]
struct Item {
    id: u32,
}

#[tokio::test]
async fn get_data_unwraps_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items/1"))
        .and(header("authorization", "Bearer token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "ok",
            "data": { "id": 1 },
            "timestamp": "2024-12-01T10:00:00"
        })))
        .mount(&server)
        .await;

    let client = JendoApiClient::with_base_url(&format!("{}/", server.uri()));
    let item: Item = client.get_data("/api/items/1", Some("token-123")).await.unwrap();

    assert_eq!(item, Item { id: 1 });
}

#[tokio::test]
async fn not_found_is_detectable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items/9"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&server)
        .await;

    let client = JendoApiClient::with_base_url(&server.uri());
    let err = client.get_data::<Item>("/api/items/9", None).await.unwrap_err();

    assert!(is_not_found(&err));
}

#[tokio::test]
async fn unsuccessful_envelope_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "disabled",
            "data": null
        })))
        .mount(&server)
        .await;

    let client = JendoApiClient::with_base_url(&server.uri());
    let err = client.get_data::<Option<Item>>("/api/items/2", None).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ApiClientError>(),
        Some(ApiClientError::Rejected(message)) if message == "disabled"
    ));
    assert!(!is_not_found(&err));
}
