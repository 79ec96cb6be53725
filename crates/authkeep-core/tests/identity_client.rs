//! IdentityClient and SessionManager against a mock identity API.

use std::sync::Arc;

use authkeep_core::{
    ApiError, AuthError, FileStore, IdentityClient, IdentityEndpoint, KeyValueStore,
    NoopNavigator, SessionManager, SESSION_KEY,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";

fn auth_body(email: &str, expires_in: &str) -> serde_json::Value {
    json!({
        "kind": "identitytoolkit#VerifyPasswordResponse",
        "localId": "uid-42",
        "email": email,
        "displayName": "",
        "idToken": "id-token-abc",
        "registered": true,
        "refreshToken": "refresh-xyz",
        "expiresIn": expires_in
    })
}

fn error_body(code: &str) -> serde_json::Value {
    json!({
        "error": {
            "code": 400,
            "message": code,
            "errors": [{"message": code, "domain": "global", "reason": "invalid"}]
        }
    })
}

fn client(server: &MockServer) -> IdentityClient {
    IdentityClient::with_base_url(format!("{}/v1", server.uri()), API_KEY).unwrap()
}

#[tokio::test]
async fn test_sign_in_request_and_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .and(query_param("key", API_KEY))
        .and(body_json(json!({
            "email": "scout@example.com",
            "password": "hunter2",
            "returnSecureToken": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("scout@example.com", "3600")))
        .expect(1)
        .mount(&server)
        .await;

    let grant = client(&server)
        .sign_in("scout@example.com", "hunter2")
        .await
        .unwrap();

    assert_eq!(grant.email, "scout@example.com");
    assert_eq!(grant.user_id, "uid-42");
    assert_eq!(grant.token, "id-token-abc");
    assert_eq!(grant.expires_in_secs, 3600);
}

#[tokio::test]
async fn test_sign_up_hits_sign_up_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .and(query_param("key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("new@example.com", "1800")))
        .expect(1)
        .mount(&server)
        .await;

    let grant = client(&server).sign_up("new@example.com", "pw").await.unwrap();
    assert_eq!(grant.expires_in_secs, 1800);
}

#[tokio::test]
async fn test_error_envelope_becomes_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_body("EMAIL_EXISTS")))
        .mount(&server)
        .await;

    let err = client(&server).sign_up("taken@example.com", "pw").await.unwrap_err();
    assert_eq!(err.code(), Some("EMAIL_EXISTS"));
    assert_eq!(AuthError::from(&err).to_string(), "This email exists already");
}

#[tokio::test]
async fn test_malformed_error_and_bad_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;

    let identity = client(&server);

    let err = identity.sign_in("a@example.com", "pw").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
    assert_eq!(AuthError::from(&err), AuthError::Unknown);

    let err = identity.sign_up("a@example.com", "pw").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_out_of_range_expiry_fails_login_cleanly() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(auth_body("scout@example.com", "99999999999999")),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("new@example.com", "-5")))
        .mount(&server)
        .await;
    let tmp = tempfile::tempdir().unwrap();

    let manager = SessionManager::with_system_time(
        Arc::new(client(&server)),
        Arc::new(FileStore::new(tmp.path())),
        Arc::new(NoopNavigator),
    );

    // Parses as a number but lands past the last representable instant
    let err = manager.login("scout@example.com", "pw").await.unwrap_err();
    assert_eq!(err, AuthError::Unknown);
    assert_eq!(err.to_string(), "An unknown error occured!");
    assert_eq!(manager.current(), None);
    assert_eq!(FileStore::new(tmp.path()).get(SESSION_KEY).unwrap(), None);

    let err = client(&server).sign_up("new@example.com", "pw").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));

    let err = manager.signup("new@example.com", "pw").await.unwrap_err();
    assert_eq!(err, AuthError::Unknown);
    assert_eq!(manager.current(), None);
    assert_eq!(FileStore::new(tmp.path()).get(SESSION_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_unreachable_server_is_unknown_error() {
    // Port 1 on loopback refuses connections
    let identity = IdentityClient::with_base_url("http://127.0.0.1:1/v1", API_KEY).unwrap();

    let err = identity.sign_in("a@example.com", "pw").await.unwrap_err();
    assert!(matches!(err, ApiError::NetworkError(_)));
    assert_eq!(AuthError::from(err).to_string(), "An unknown error occured!");
}

#[tokio::test]
async fn test_login_persists_and_restores_across_managers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("scout@example.com", "3600")))
        .mount(&server)
        .await;
    let tmp = tempfile::tempdir().unwrap();

    let first = SessionManager::with_system_time(
        Arc::new(client(&server)),
        Arc::new(FileStore::new(tmp.path())),
        Arc::new(NoopNavigator),
    );
    let session = first.login("scout@example.com", "pw").await.unwrap();
    assert!(FileStore::new(tmp.path()).get(SESSION_KEY).unwrap().is_some());

    // A fresh manager over the same directory stands in for a restart
    let second = SessionManager::with_system_time(
        Arc::new(client(&server)),
        Arc::new(FileStore::new(tmp.path())),
        Arc::new(NoopNavigator),
    );
    assert!(second.restore_session());
    assert_eq!(second.current(), Some(session));
    assert_eq!(second.token().as_deref(), Some("id-token-abc"));

    second.logout();
    assert_eq!(FileStore::new(tmp.path()).get(SESSION_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_rejected_login_leaves_store_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_body("INVALID_PASSWORD")))
        .mount(&server)
        .await;
    let tmp = tempfile::tempdir().unwrap();

    let manager = SessionManager::with_system_time(
        Arc::new(client(&server)),
        Arc::new(FileStore::new(tmp.path())),
        Arc::new(NoopNavigator),
    );

    let err = manager.login("scout@example.com", "wrong").await.unwrap_err();
    assert_eq!(err.to_string(), "This password is not correct.");
    assert_eq!(manager.current(), None);
    assert_eq!(FileStore::new(tmp.path()).get(SESSION_KEY).unwrap(), None);
}
