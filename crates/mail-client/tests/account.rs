//! Account lifecycle against a mock backend.

use std::sync::Arc;
use std::time::Duration;

use mail_auth::{FileStorage, LoginRequest, MemoryStorage, SessionStore};
use mail_client::{AuthenticatedClient, Error, account};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, session: Arc<SessionStore>) -> AuthenticatedClient {
    AuthenticatedClient::connect(
        &format!("{}/api", server.uri()),
        session,
        Duration::from_secs(5),
    )
    .unwrap()
    .build()
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"username": "ann", "password": "secret123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "at_1",
            "refreshToken": "rt_1",
            "username": "ann",
            "email": "ann@example.com",
            "firstName": "Ann",
            "lastName": "Lee",
            "role": "USER"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_stores_tokens_and_sends_no_bearer() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    // A stale token from an earlier session must not leak onto the login call
    let session = Arc::new(
        SessionStore::restore(MemoryStorage::with_tokens("at_stale", "rt_stale"))
            .await
            .unwrap(),
    );
    let client = client_for(&server, session.clone());

    let user = account::login(&client, &LoginRequest::new("ann", "secret123"))
        .await
        .unwrap();
    assert_eq!(user.username, "ann");
    assert_eq!(user.display_name(), "Ann Lee");

    assert_eq!(
        session.access_token().map(|t| t.expose().clone()).as_deref(),
        Some("at_1")
    );
    assert_eq!(
        session.refresh_token().map(|t| t.expose().clone()).as_deref(),
        Some("rt_1")
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn wrong_password_is_unauthorized_and_keeps_session_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = Arc::new(SessionStore::in_memory());
    let client = client_for(&server, session.clone());

    let err = account::login(&client, &LoginRequest::new("ann", "nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn logout_clears_session_even_when_backend_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("authorization", "Bearer at_1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let session = Arc::new(SessionStore::in_memory());
    session
        .set_tokens("at_1".into(), Some("rt_1".into()))
        .await
        .unwrap();
    let client = client_for(&server, session.clone());

    account::logout(&client).await.unwrap();
    assert!(!session.is_authenticated());
    assert!(session.refresh_token().is_none());
}

#[tokio::test]
async fn check_auth_returns_profile_for_valid_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .and(header("authorization", "Bearer at_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4,
            "username": "ann",
            "email": "ann@example.com",
            "role": "USER"
        })))
        .mount(&server)
        .await;

    let session = Arc::new(SessionStore::in_memory());
    session
        .set_tokens("at_1".into(), Some("rt_1".into()))
        .await
        .unwrap();
    let client = client_for(&server, session.clone());

    let user = account::check_auth(&client).await.unwrap().unwrap();
    assert_eq!(user.id, Some(4));
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn check_auth_failure_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = Arc::new(SessionStore::in_memory());
    session
        .set_tokens("at_1".into(), Some("rt_1".into()))
        .await
        .unwrap();
    let client = client_for(&server, session.clone());

    assert!(account::check_auth(&client).await.unwrap().is_none());
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn check_auth_without_session_makes_no_call() {
    let server = MockServer::start().await;
    let client = client_for(&server, Arc::new(SessionStore::in_memory()));

    assert!(account::check_auth(&client).await.unwrap().is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn logged_in_session_survives_restart() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session.json");

    {
        let session = Arc::new(SessionStore::restore(FileStorage::new(&session_file)).await.unwrap());
        let client = client_for(&server, session);
        account::login(&client, &LoginRequest::new("ann", "secret123"))
            .await
            .unwrap();
    }

    let restored = SessionStore::restore(FileStorage::new(&session_file)).await.unwrap();
    assert!(restored.is_authenticated());
    assert_eq!(
        restored.access_token().map(|t| t.expose().clone()).as_deref(),
        Some("at_1")
    );
}
