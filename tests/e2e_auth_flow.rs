//! End-to-End Test Suite: authenticated requests against a mock HTTP server
//!
//! Drives [`AuthClient`] through the real reqwest transport: token attachment,
//! refresh on 401 with a single replay, refresh-exempt endpoints, body parsing
//! and error normalization, and the safe-call adapter.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use minifetch::{
    safe_get, safe_post, AuthClient, BoxError, BroadcastLogout, FetchConfig, FetchError,
    InMemoryTokenStore, LogoutReason, RefreshOutcome, RequestOptions, StatusCode, TokenStore,
    TransportError, DEFAULT_ERROR_CODE,
};
use serde_json::{json, Value};
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Client whose refresher hands out `fresh`, counting its calls
fn client_with_refresh(
    server: &MockServer,
    tokens: Arc<InMemoryTokenStore>,
    refreshes: Arc<AtomicUsize>,
) -> AuthClient {
    AuthClient::builder(FetchConfig::new(server.uri()))
        .token_store(tokens)
        .refresher(move || {
            refreshes.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, BoxError>(RefreshOutcome::from("fresh")) }
        })
        .build()
        .expect("Failed to build client")
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_request_replayed() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "ada"})))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = Arc::new(InMemoryTokenStore::with_token("stale"));
    let refreshes = Arc::new(AtomicUsize::new(0));
    let client = client_with_refresh(&server, tokens.clone(), refreshes.clone());

    let me: Value = client
        .get("/users/me", RequestOptions::new())
        .await
        .expect("Request should succeed after refresh");

    assert_eq!(me, json!({"id": 1, "name": "ada"}));
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(tokens.token().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_second_401_is_final() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "revoked"})))
        .expect(2)
        .mount(&server)
        .await;

    let refreshes = Arc::new(AtomicUsize::new(0));
    let client = client_with_refresh(
        &server,
        Arc::new(InMemoryTokenStore::with_token("stale")),
        refreshes.clone(),
    );

    let error = client
        .get::<Value>("/users/me", RequestOptions::new())
        .await
        .unwrap_err();

    assert!(error.is_unauthorized());
    assert_eq!(error.as_client_error().unwrap().message, "revoked");
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_refresh_endpoint_401_does_not_refresh() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let refreshes = Arc::new(AtomicUsize::new(0));
    let client = client_with_refresh(
        &server,
        Arc::new(InMemoryTokenStore::with_token("stale")),
        refreshes.clone(),
    );

    let error = client
        .post::<Value, _>("/auth/refresh", &(), RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(refreshes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_refresh_signals_logout() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = Arc::new(InMemoryTokenStore::with_token("stale"));
    let logout = BroadcastLogout::default();
    let mut events = logout.subscribe();
    let client = AuthClient::builder(FetchConfig::new(server.uri()))
        .token_store(tokens.clone())
        .refresher(|| async { Err::<RefreshOutcome, BoxError>("refresh endpoint down".into()) })
        .logout_signal(Arc::new(logout))
        .build()
        .expect("Failed to build client");

    let error = client
        .get::<Value>("/users/me", RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(error.code(), Some(DEFAULT_ERROR_CODE));
    assert_eq!(tokens.token(), None);
    assert_eq!(
        events.recv().await.expect("logout event"),
        LogoutReason::RefreshException
    );
}

#[tokio::test]
async fn test_post_sends_json_and_empty_reply_is_null() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/friends"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"friend_id": 42})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = AuthClient::new(FetchConfig::new(server.uri())).expect("Failed to build client");

    let reply: Value = client
        .post("/friends", &json!({"friend_id": 42}), RequestOptions::new())
        .await
        .expect("POST should succeed");

    assert_eq!(reply, Value::Null);
}

#[tokio::test]
async fn test_validation_error_is_normalized() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "body/pwd must NOT have fewer than 8 characters",
            "code": "FST_ERR_VALIDATION"
        })))
        .mount(&server)
        .await;

    let client = AuthClient::new(FetchConfig::new(server.uri())).expect("Failed to build client");

    let result = safe_post::<Value, _>(
        &client,
        "/auth/login",
        &json!({"user": "ada", "pwd": "short"}),
        RequestOptions::new(),
    )
    .await;

    let (data, error) = result.into_parts();
    assert!(data.is_none());
    let error = error.expect("error should be populated");
    let client_error = error.as_client_error().expect("HTTP error");
    assert_eq!(client_error.status, StatusCode::BAD_REQUEST);
    assert_eq!(client_error.code, "FST_ERR_VALIDATION");
    assert_eq!(
        client_error.message,
        "Password must NOT have fewer than 8 characters"
    );
}

#[tokio::test]
async fn test_safe_get_with_non_json_error_body() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>not found</html>"))
        .mount(&server)
        .await;

    let client = AuthClient::new(FetchConfig::new(server.uri())).expect("Failed to build client");

    let result = safe_get::<Value>(&client, "/missing", RequestOptions::new()).await;

    let error = result.error().expect("error should be populated");
    assert_eq!(error.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(error.code(), Some(DEFAULT_ERROR_CODE));
    assert_eq!(error.as_client_error().unwrap().message, "Not Found");
    assert_eq!(error.as_client_error().unwrap().data, Value::Null);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    init_tracing();
    let client =
        AuthClient::new(FetchConfig::new("http://127.0.0.1:1")).expect("Failed to build client");

    let error = client
        .get::<Value>("/health", RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        FetchError::Transport(TransportError::Request(_))
    ));
    assert_eq!(error.status(), None);
}
