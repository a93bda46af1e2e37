//! Integration tests for HttpCoinClient using wiremock
//!
//! These tests validate the HTTP client's behavior with mock servers.

use coinsync::client::{CoinService, HttpCoinClient};
use coinsync::utils::error::ServiceError;
use coinsync::utils::retry::RetryConfig;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpCoinClient {
    HttpCoinClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

/// Test first page request carries no cursor
#[tokio::test]
async fn test_list_first_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins"))
        .and(query_param("limit", "2"))
        .and(query_param_is_missing("maxId"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 9, "verified": true, "deployedPool": "0xabc", "name": "Nine"},
            {"id": 8, "verified": false, "deployedPool": null}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let coins = client(&mock_server).list_coins(2, None).await.unwrap();

    assert_eq!(coins.len(), 2);
    assert_eq!(coins[0].id, 9);
    assert_eq!(coins[0].deployed_pool.as_deref(), Some("0xabc"));
    assert_eq!(coins[0].name.as_deref(), Some("Nine"));
    assert!(coins[1].is_candidate());
}

/// Test cursor zero is still sent
#[tokio::test]
async fn test_list_sends_zero_cursor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins"))
        .and(query_param("maxId", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 0}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let coins = client(&mock_server).list_coins(10, Some(0)).await.unwrap();
    assert_eq!(coins, vec![coinsync::Coin::new(0, false, None)]);
}

/// Test malformed list payload is a decode error
#[tokio::test]
async fn test_list_malformed_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).list_coins(10, None).await;
    assert!(matches!(result, Err(ServiceError::Decode(_))));
}

/// Test get unwraps the coin envelope
#[tokio::test]
async fn test_get_coin() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coin/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "coin": {"id": 42, "verified": true, "contractAddress": "0xdef", "graduated": true}
        })))
        .mount(&mock_server)
        .await;

    let coin = client(&mock_server).get_coin(42).await.unwrap();
    assert_eq!(coin.id, 42);
    assert!(coin.verified);
    assert!(coin.graduated);
    assert_eq!(coin.contract_address.as_deref(), Some("0xdef"));
}

/// Test 404 keeps status and body
#[tokio::test]
async fn test_get_missing_coin() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coin/7"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Coin not found"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).get_coin(7).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(!err.is_retryable());
    assert_eq!(err.to_string(), "Service returned 404: Coin not found");
}

/// Test sync returns the raw body, marker included
#[tokio::test]
async fn test_sync_returns_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/coin/3/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"PairNotFound(0x01)\""))
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = client(&mock_server).sync_coin(3).await.unwrap();
    assert!(body.contains("PairNotFound"));
}

/// Test deploy ignores the body and reports failures
#[tokio::test]
async fn test_deploy_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/coin/3/deploy"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"Deployed 0xpool\""))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/coin/4/deploy"))
        .respond_with(ResponseTemplate::new(500).set_body_string("revert"))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    assert!(client.deploy_coin(3).await.is_ok());

    let err = client.deploy_coin(4).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

/// Test no retries happen by default
#[tokio::test]
async fn test_server_error_not_retried_by_default() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/coin/1/sync"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).sync_coin(1).await;
    assert!(result.is_err());
}

/// Test that server errors trigger retries when enabled
#[tokio::test]
async fn test_server_error_retry() {
    let mock_server = MockServer::start().await;

    // Return 500 twice, then succeed
    Mock::given(method("POST"))
        .and(path("/coin/1/sync"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/coin/1/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server).with_retry(RetryConfig::with_delays(3, 10, 50));
    let body = client.sync_coin(1).await.unwrap();
    assert_eq!(body, "OK");
}

/// Test timeout maps to its own variant
#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coin/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"coin": {"id": 1}}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let client = HttpCoinClient::new(&mock_server.uri(), Duration::from_millis(50)).unwrap();
    let result = client.get_coin(1).await;
    assert!(matches!(result, Err(ServiceError::Timeout)));
}

/// Test trailing slash in the base URL is tolerated
#[tokio::test]
async fn test_base_url_trailing_slash() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/coin/2/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client =
        HttpCoinClient::new(&format!("{}/", mock_server.uri()), Duration::from_secs(5)).unwrap();
    assert_eq!(client.sync_coin(2).await.unwrap(), "OK");
}
