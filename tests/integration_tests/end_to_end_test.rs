//! Full runs over HTTP against a mock coin service
//!
//! Tests the complete workflow:
//! 1. Config to client
//! 2. Paginated load
//! 3. Verify syncs
//! 4. Reload
//! 5. Deploy syncs and deploys

use coinsync::client::HttpCoinClient;
use coinsync::config::Config;
use coinsync::sync::{SyncOptions, SyncOrchestrator};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn three_coins() -> Value {
    json!([
        {"id": 30, "verified": true, "deployedPool": "P"},
        {"id": 20, "verified": true, "deployedPool": null},
        {"id": 10, "verified": false, "deployedPool": null}
    ])
}

fn config_for(server: &MockServer, page_size: usize) -> Config {
    let mut config = Config::default();
    config.service.base_url = server.uri();
    config.service.request_timeout_secs = 5;
    config.sync.page_size = page_size;
    config.sync.batch_pause_ms = 0;
    config
}

async fn mount_coin_actions(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/coin/10/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(2)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/coin/20/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Error: PairNotFound"))
        .expect(2)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/coin/20/deploy"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"Deployed\""))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/coin/10/deploy"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/coin/30/sync"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_three_coin_run_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins"))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_coins()))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_coin_actions(&mock_server).await;

    let config = config_for(&mock_server, 20_000);
    let client = Arc::new(HttpCoinClient::from_config(&config).unwrap());
    let mut run = SyncOrchestrator::new(client, SyncOptions::from_config(&config));

    let report = run.run().await.unwrap();

    assert_eq!(report.total_considered, 2);
    assert_eq!(report.verified, 1);
    assert_eq!(report.deployed, 1);
}

#[tokio::test]
async fn test_paginated_run_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins"))
        .and(query_param_is_missing("maxId"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 30, "verified": true, "deployedPool": "P"},
            {"id": 20, "verified": true, "deployedPool": null}
        ])))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/coins"))
        .and(query_param("maxId", "19"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 10, "verified": false, "deployedPool": null}
        ])))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/coins"))
        .and(query_param("maxId", "9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&mock_server)
        .await;

    mount_coin_actions(&mock_server).await;

    let mut config = config_for(&mock_server, 2);
    config.sync.max_concurrent_requests = 1;
    config.sync.batch_size = 1;
    let client = Arc::new(HttpCoinClient::from_config(&config).unwrap());
    let mut run = SyncOrchestrator::new(client, SyncOptions::from_config(&config));

    let report = run.run().await.unwrap();

    assert_eq!(report.counts(), (1, 1, 2));
}

#[tokio::test]
async fn test_failing_sync_over_http_is_absorbed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 6, "verified": false, "deployedPool": null},
            {"id": 5, "verified": false, "deployedPool": null},
            {"id": 4, "verified": false, "deployedPool": null}
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/coin/5/sync"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
        .mount(&mock_server)
        .await;

    for id in [4, 6] {
        Mock::given(method("POST"))
            .and(path(format!("/coin/{id}/sync")))
            .respond_with(ResponseTemplate::new(200).set_body_string("PairNotFound"))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path(format!("/coin/{id}/deploy")))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let config = config_for(&mock_server, 100);
    let client = Arc::new(HttpCoinClient::from_config(&config).unwrap());
    let mut run = SyncOrchestrator::new(client, SyncOptions::from_config(&config));

    let report = run.run().await.unwrap();

    assert_eq!(report.counts(), (2, 2, 3));
    assert_eq!(report.verify_failures, 1);
    assert_eq!(report.deploy_failures, 1);
}

#[tokio::test]
async fn test_listing_failure_over_http_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad gateway"))
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server, 100);
    let client = Arc::new(HttpCoinClient::from_config(&config).unwrap());
    let mut run = SyncOrchestrator::new(client, SyncOptions::from_config(&config));

    let err = run.run().await.unwrap_err();
    assert!(err.to_string().contains("502"));
}
