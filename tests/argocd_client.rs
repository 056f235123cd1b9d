//! Argo CD client tests against a mock API server

use argocd_token_provider::argocd::{
    ArgoCdClient, ArgoCdSessionProvider, ClientOptions, MintOptions, SessionProvider, TokenMinter,
};
use argocd_token_provider::credentials::Credentials;
use argocd_token_provider::error::Error;
use std::time::Duration;
use wiremock::matchers::{bearer_token, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options() -> ClientOptions {
    ClientOptions {
        user_agent: "argocd-token-provider/test".to_string(),
        timeout: Duration::from_secs(5),
    }
}

fn admin() -> Credentials {
    Credentials::new("admin", "s3cr3t")
}

async fn mount_session(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v1/session"))
        .and(body_json(serde_json::json!({ "username": "admin", "password": "s3cr3t" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": token })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_then_mint_uses_session_token() {
    let server = MockServer::start().await;
    mount_session(&server, "session-jwt").await;
    Mock::given(method("POST"))
        .and(path("/api/v1/account/alice/token"))
        .and(bearer_token("session-jwt"))
        .and(body_json(serde_json::json!({ "name": "alice", "id": "ci", "expiresIn": 3600 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "alice-jwt" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ArgoCdClient::new(&server.uri(), &options()).unwrap();
    let session = client.login(&admin()).await.unwrap();
    let token = session
        .mint_token(
            "alice",
            &MintOptions {
                id: "ci".to_string(),
                expires_in: 3600,
            },
        )
        .await
        .unwrap();

    assert_eq!(token, "alice-jwt");
}

#[tokio::test]
async fn test_session_provider_returns_working_minter() {
    let server = MockServer::start().await;
    mount_session(&server, "session-jwt").await;
    Mock::given(method("POST"))
        .and(path("/api/v1/account/bob/token"))
        .and(bearer_token("session-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "bob-jwt" })))
        .mount(&server)
        .await;

    let minter = ArgoCdSessionProvider::new(options())
        .login(&format!("{}/", server.uri()), &admin())
        .await
        .unwrap();
    let token = minter
        .mint_token(
            "bob",
            &MintOptions {
                id: "x".to_string(),
                expires_in: 0,
            },
        )
        .await
        .unwrap();

    assert_eq!(token, "bob-jwt");
}

#[tokio::test]
async fn test_user_agent_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/session"))
        .and(header("user-agent", "argocd-token-provider/test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "jwt" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ArgoCdClient::new(&server.uri(), &options()).unwrap();
    client.login(&admin()).await.unwrap();
}

#[tokio::test]
async fn test_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/session"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid username or password"))
        .mount(&server)
        .await;

    let client = ArgoCdClient::new(&server.uri(), &options()).unwrap();
    let err = client.login(&admin()).await.unwrap_err();

    match err {
        Error::AuthenticationFailed { message, .. } => {
            assert!(message.contains("401"), "{message}");
            assert!(message.contains("invalid username or password"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_session_without_token_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let client = ArgoCdClient::new(&server.uri(), &options()).unwrap();
    let err = client.login(&admin()).await.unwrap_err();

    assert!(matches!(err, Error::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn test_mint_server_error() {
    let server = MockServer::start().await;
    mount_session(&server, "session-jwt").await;
    Mock::given(method("POST"))
        .and(path("/api/v1/account/alice/token"))
        .respond_with(ResponseTemplate::new(500).set_body_string("account alice does not exist"))
        .mount(&server)
        .await;

    let client = ArgoCdClient::new(&server.uri(), &options()).unwrap();
    let session = client.login(&admin()).await.unwrap();
    let err = session
        .mint_token(
            "alice",
            &MintOptions {
                id: "ci".to_string(),
                expires_in: 0,
            },
        )
        .await
        .unwrap_err();

    match err {
        Error::TokenMintFailed { account, message, source } => {
            assert!(source.is_none());
            assert_eq!(account, "alice");
            assert!(message.contains("does not exist"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unreachable_server() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = ArgoCdClient::new(&uri, &options()).unwrap();
    let err = client.login(&admin()).await.unwrap_err();

    assert!(matches!(err, Error::AuthenticationFailed { .. }));
    let cause = std::error::Error::source(&err).expect("transport error kept as source");
    assert!(cause.downcast_ref::<reqwest::Error>().is_some());
}

#[tokio::test]
async fn test_malformed_session_response_keeps_cause() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/session"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let client = ArgoCdClient::new(&server.uri(), &options()).unwrap();
    let err = client.login(&admin()).await.unwrap_err();

    match &err {
        Error::AuthenticationFailed { message, source, .. } => {
            assert_eq!(message, "invalid session response");
            assert!(source.as_ref().is_some_and(reqwest::Error::is_decode));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_blank_server_address_is_rejected() {
    let err = ArgoCdClient::new("   ", &options()).unwrap_err();
    assert!(matches!(err, Error::MissingServerAddress));
}
