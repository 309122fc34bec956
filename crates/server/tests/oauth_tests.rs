mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use restvoice_server::api::router;
use restvoice_server::auth::{OAuthError, OAuthExchange};
use restvoice_server::config::AuthConfig;

use common::{CLIENT_ID, MockIdp, app_state};

fn issued() -> Value {
    json!({
        "access_token": "eyJ.issued.token",
        "expires_in": 3600,
        "token_type": "Bearer",
        "userId": "alice",
    })
}

fn config(idp: &MockIdp) -> AuthConfig {
    AuthConfig {
        redirect_uri: "http://localhost:8080/auth/token".to_owned(),
        ..idp.auth_config()
    }
}

#[tokio::test]
async fn code_is_exchanged_for_token() {
    let idp = MockIdp::start().await;
    idp.reply_to_token_requests(200, issued());
    let exchange = OAuthExchange::new(&config(&idp)).unwrap();

    let info = exchange.exchange("abc123").await.unwrap();
    assert_eq!(info.access_token, "eyJ.issued.token");
    assert_eq!(info.expires_in, 3600);
    assert_eq!(info.user_id, "alice");

    let requests = idp.token_requests();
    assert_eq!(requests.len(), 1);
    let form = &requests[0];
    assert_eq!(form["code"], "abc123");
    assert_eq!(form["client_id"], CLIENT_ID);
    assert_eq!(form["client_secret"], "client-secret");
    assert_eq!(form["grant_type"], "authorization_code");
    assert_eq!(form["redirect_uri"], "http://localhost:8080/auth/token");
}

#[tokio::test]
async fn refused_code_reports_status() {
    let idp = MockIdp::start().await;
    idp.reply_to_token_requests(400, json!({"error": "invalid_grant"}));
    let exchange = OAuthExchange::new(&config(&idp)).unwrap();

    assert!(matches!(
        exchange.exchange("stale").await,
        Err(OAuthError::Status(400))
    ));
}

#[tokio::test]
async fn non_bearer_token_type_is_invalid() {
    let idp = MockIdp::start().await;
    let mut body = issued();
    body["token_type"] = json!("mac");
    idp.reply_to_token_requests(200, body);
    let exchange = OAuthExchange::new(&config(&idp)).unwrap();

    assert!(matches!(
        exchange.exchange("abc123").await,
        Err(OAuthError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn malformed_body_is_invalid() {
    let idp = MockIdp::start().await;
    idp.reply_to_token_requests(200, json!({"access_token": "x"}));
    let exchange = OAuthExchange::new(&config(&idp)).unwrap();

    assert!(matches!(
        exchange.exchange("abc123").await,
        Err(OAuthError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn unreachable_token_endpoint_is_transport_error() {
    let config = AuthConfig {
        token_url: "http://127.0.0.1:9/oauth2/token".to_owned(),
        http_timeout_seconds: 1,
        ..AuthConfig::default()
    };
    let exchange = OAuthExchange::new(&config).unwrap();

    assert!(matches!(
        exchange.exchange("abc123").await,
        Err(OAuthError::Transport(_))
    ));
}

// =============================================================================
// GET /auth/token
// =============================================================================

async fn get(idp: &MockIdp, uri: &str) -> (StatusCode, Option<String>, Value) {
    let app = router(app_state(&config(idp)).0);
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let challenge = resp
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .map(|v| v.to_str().unwrap().to_owned());
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, challenge, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn redirect_returns_issued_token() {
    let idp = MockIdp::start().await;
    idp.reply_to_token_requests(200, issued());

    let (status, _, body) = get(&idp, "/auth/token?code=abc123&userState=Authenticated").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, issued());
}

#[tokio::test]
async fn redirect_without_completed_login_is_not_acceptable() {
    let idp = MockIdp::start().await;
    idp.reply_to_token_requests(200, issued());

    for uri in [
        "/auth/token",
        "/auth/token?userState=Authenticated",
        "/auth/token?code=&userState=Authenticated",
        "/auth/token?code=abc123",
        "/auth/token?code=abc123&userState=AuthenticatedNotRegistered",
    ] {
        let (status, challenge, _) = get(&idp, uri).await;
        assert_eq!(status, StatusCode::NOT_ACCEPTABLE, "{uri}");
        assert!(challenge.is_some_and(|c| c.starts_with("Bearer")), "{uri}");
    }
    assert!(idp.token_requests().is_empty());
}

#[tokio::test]
async fn refused_exchange_is_unauthorized() {
    let idp = MockIdp::start().await;

    let (status, challenge, body) =
        get(&idp, "/auth/token?code=abc123&userState=Authenticated").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(challenge.is_some());
    assert!(body["error"].is_string());
    assert_eq!(idp.token_requests().len(), 1);
}
