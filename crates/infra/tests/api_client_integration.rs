//! Integration tests for the vendor API client against a mock HTTP server

mod support;

use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uplinkbridge_common::testing::{MemoryTokenStore, MockTokenEndpoint};
use uplinkbridge_common::TokenManager;
use uplinkbridge_core::UplinkApi;
use uplinkbridge_domain::{ApiError, ApiErrorCategory, ParameterBatch, Token};
use uplinkbridge_infra::config::ConfigHandle;
use uplinkbridge_infra::UplinkClient;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{config, CountingTokens};

const SYSTEM_PATH: &str = "/api/v1/systems/36563";

fn client_for(server: &MockServer) -> (UplinkClient, Arc<CountingTokens>) {
    let tokens = Arc::new(CountingTokens::default());
    let config = config(&format!("api_base_url = \"{}\"", server.uri()));
    let client = UplinkClient::new(Arc::new(ConfigHandle::fixed(config)), tokens.clone()).unwrap();
    (client, tokens)
}

/// Validates bearer auth, the accept header and the system resource path
#[tokio::test]
async fn test_system_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SYSTEM_PATH))
        .and(header("authorization", "Bearer token-0"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"connectionStatus": "ONLINE"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let system = client.system().await.unwrap();
    assert_eq!(system["connectionStatus"], "ONLINE");
}

/// Validates one `parameterIds` query pair per id
#[tokio::test]
async fn test_parameter_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{SYSTEM_PATH}/parameters")))
        .and(query_param("parameterIds", "40004"))
        .and(query_param("parameterIds", "43084"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"parameterId": 40004, "rawValue": 205},
            {"parameterId": 43084, "rawValue": 4500}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let batch = ParameterBatch::new(vec![40004, 43084]).unwrap();
    let page = client.parameters(&batch).await.unwrap();
    assert_eq!(page.as_array().map(Vec::len), Some(2));
}

/// Validates that a 401 forces one refresh and one retry with the new token
#[tokio::test]
async fn test_unauthorized_refreshes_and_retries_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{SYSTEM_PATH}/status/system")))
        .and(header("authorization", "Bearer token-0"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{SYSTEM_PATH}/status/system")))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"title": "Heating"}])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, tokens) = client_for(&server);
    let status = client.status().await.unwrap();

    assert_eq!(status[0]["title"], "Heating");
    assert_eq!(tokens.refreshes.load(Ordering::SeqCst), 1);
}

/// Validates that concurrent calls rejected with the same token trigger a
/// single refresh exchange
#[tokio::test]
async fn test_concurrent_rejections_share_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer revoked"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer refreshed-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let endpoint = Arc::new(MockTokenEndpoint::new());
    endpoint.set_delay(std::time::Duration::from_millis(20));
    let store = Arc::new(MemoryTokenStore::new(Some(Token::new(
        "revoked",
        "refresh",
        Utc::now(),
        3600,
    ))));
    let manager = Arc::new(TokenManager::new(endpoint.clone(), store));
    manager.initialize().await.unwrap();

    let config = config(&format!("api_base_url = \"{}\"", server.uri()));
    let client =
        Arc::new(UplinkClient::new(Arc::new(ConfigHandle::fixed(config)), manager).unwrap());

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.status().await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(endpoint.refresh_calls(), 1);
}

/// Validates that a second 401 is reported rather than retried again
#[tokio::test]
async fn test_persistent_unauthorized_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let (client, tokens) = client_for(&server);
    let err = client.software().await.unwrap_err();

    assert_eq!(err.category(), ApiErrorCategory::Authorization);
    assert_eq!(tokens.refreshes.load(Ordering::SeqCst), 1);
}

/// Validates mapping of rate limiting and server failures
#[tokio::test]
async fn test_rate_limit_and_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{SYSTEM_PATH}/notifications")))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SYSTEM_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (client, tokens) = client_for(&server);

    assert!(matches!(client.notifications().await, Err(ApiError::RateLimited)));
    assert!(matches!(client.system().await, Err(ApiError::Server { status: 503 })));
    assert_eq!(tokens.refreshes.load(Ordering::SeqCst), 0);
}

/// Validates that a body that is not JSON is a decode error
#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    assert!(matches!(client.status().await, Err(ApiError::Decode(_))));
}

/// Validates the three write calls
#[tokio::test]
async fn test_write_calls() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("{SYSTEM_PATH}/smarthome/mode")))
        .and(body_json(json!({"mode": "AWAY_FROM_HOME"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{SYSTEM_PATH}/parameters")))
        .and(body_json(json!({"settings": {"47011": "2"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{SYSTEM_PATH}/smarthome/thermostats")))
        .and(body_json(json!({"externalId": 7, "name": "Hall", "actualTemp": 215})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    client.set_mode("AWAY_FROM_HOME").await.unwrap();
    client.set_parameters(&BTreeMap::from([(47011, "2".to_string())])).await.unwrap();
    let thermostat = json!({"externalId": 7, "name": "Hall", "actualTemp": 215});
    client.set_thermostat(thermostat.as_object().unwrap()).await.unwrap();
}

/// Validates that a rejected write is a client error carrying the body
#[tokio::test]
async fn test_rejected_write_is_client_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(400).set_body_string("parameter is read-only"))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let err = client.set_mode("BOGUS").await.unwrap_err();
    assert!(matches!(err, ApiError::Client { status: 400, ref message } if message.contains("read-only")));
}
