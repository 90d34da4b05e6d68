use courier_sync::{
    CatalogClient, CredentialManager, HttpRequest, HttpTransport, MemoryTokenStore, PathaoProvider,
    ProviderCredentials, ProviderEndpoints, ReqwestTransport, SyncError,
};
use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use serde_json::json;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn transport() -> Arc<dyn HttpTransport> {
    Arc::new(ReqwestTransport::with_timeout(Duration::from_secs(5)).expect("reqwest client builds"))
}

fn credentials(base_url: &str) -> ProviderCredentials {
    ProviderCredentials {
        base_url: base_url.to_string(),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        username: "merchant@example.com".to_string(),
        password: "hunter2".to_string(),
    }
}

#[tokio::test]
async fn password_grant_then_city_list_over_http() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();

    let token_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/aladdin/api/v1/issue-token")
            .header("content-type", "application/json")
            .json_body(json!({
                "client_id": "client",
                "client_secret": "secret",
                "grant_type": "password",
                "username": "merchant@example.com",
                "password": "hunter2"
            }));
        then.status(200).json_body(json!({
            "token_type": "Bearer",
            "expires_in": 432000,
            "access_token": "live-token",
            "refresh_token": "live-refresh"
        }));
    });

    let cities_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/aladdin/api/v1/city-list")
            .header("authorization", "Bearer live-token");
        then.status(200).json_body(json!({
            "message": "City successfully fetched.",
            "type": "success",
            "code": 200,
            "data": {"data": [
                {"city_id": 1, "city_name": "Dhaka"},
                {"city_id": 2, "city_name": "Chittagong"}
            ]}
        }));
    });

    let endpoints = ProviderEndpoints::new(&server.base_url(), Arc::new(PathaoProvider))
        .expect("mock server url parses");
    let transport = transport();
    let manager = CredentialManager::new(
        endpoints.clone(),
        credentials(&server.base_url()),
        transport.clone(),
        Arc::new(MemoryTokenStore::new()),
    );

    let token = manager.get_valid_access_token().await.expect("token issued");
    assert_eq!(token, "live-token");

    // Second call is served from the cache.
    manager.get_valid_access_token().await.expect("cached token");
    token_mock.assert_hits(1);

    let client = CatalogClient::new(endpoints, transport, token);
    let cities = client.list_cities().await.expect("cities fetched");
    assert_eq!(cities.len(), 2);
    assert_eq!(cities[0].city_name, "Dhaka");
    cities_mock.assert();
}

#[tokio::test]
async fn non_success_status_surfaces_as_fetch_error() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/aladdin/api/v1/cities/9/zone-list");
        then.status(500).body("upstream exploded");
    });

    let endpoints = ProviderEndpoints::new(&server.base_url(), Arc::new(PathaoProvider))
        .expect("mock server url parses");
    let client = CatalogClient::new(endpoints, transport(), "tok".to_string());

    let err = client.list_zones(9).await.expect_err("500 should fail");
    match err {
        SyncError::FetchFailed { status, .. } => assert_eq!(status, Some(500)),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn transport_reports_unreachable_host() {
    let transport = ReqwestTransport::with_timeout(Duration::from_millis(200)).expect("client builds");
    let request = HttpRequest::get_with_bearer("http://127.0.0.1:9/unreachable", "tok");

    assert!(transport.send(request).await.is_err());
}
