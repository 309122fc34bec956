#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};

use restvoice_server::api::{AppState, UseCases};
use restvoice_server::config::AuthConfig;
use restvoice_state_memory::MemoryRepository;

pub const ISSUER: &str = "http://idp.test";
pub const CLIENT_ID: &str = "restvoice-test";
pub const REALM: &str = "restvoice.test";

pub const PRIMARY_KID: &str = "primary";
pub const ROTATED_KID: &str = "rotated";

pub const PRIMARY_PRIVATE: &str = include_str!("../fixtures/primary_private.pem");
pub const PRIMARY_PUBLIC: &str = include_str!("../fixtures/primary_public.pem");
pub const ROTATED_PRIVATE: &str = include_str!("../fixtures/rotated_private.pem");
pub const ROTATED_PUBLIC: &str = include_str!("../fixtures/rotated_public.pem");
pub const ROTATED_JWK: &str = include_str!("../fixtures/rotated_jwk.json");

/// Identity provider stand-in serving a key set, a public key endpoint and
/// a token endpoint.
#[derive(Clone, Default)]
pub struct IdpState {
    keys: Arc<Mutex<Vec<Value>>>,
    pems: Arc<Mutex<HashMap<String, String>>>,
    token_reply: Arc<Mutex<Option<(u16, Value)>>>,
    token_requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
    jwks_hits: Arc<AtomicUsize>,
    public_key_hits: Arc<AtomicUsize>,
}

pub struct MockIdp {
    pub base: String,
    state: IdpState,
}

impl MockIdp {
    pub async fn start() -> Self {
        let state = IdpState::default();
        let app = Router::new()
            .route("/.well-known/jwks.json", get(jwks))
            .route("/api/jwt/public-key", get(public_key))
            .route("/oauth2/token", post(token))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base: format!("http://{addr}"),
            state,
        }
    }

    pub fn jwks_url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.base)
    }

    pub fn public_key_url(&self) -> String {
        format!("{}/api/jwt/public-key", self.base)
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth2/token", self.base)
    }

    /// Publish a signing key with its PEM inline.
    pub fn publish(&self, kid: &str, public_pem: &str) {
        self.publish_record(json!({
            "alg": "RS256",
            "kid": kid,
            "use": "sig",
            "publicKey": public_pem,
        }));
    }

    /// Publish a signing key whose PEM is only served by the public key
    /// endpoint.
    pub fn publish_by_reference(&self, kid: &str, public_pem: &str) {
        self.state
            .pems
            .lock()
            .unwrap()
            .insert(kid.to_owned(), public_pem.to_owned());
        self.publish_record(json!({ "alg": "RS256", "kid": kid, "use": "sig" }));
    }

    pub fn publish_record(&self, record: Value) {
        self.state.keys.lock().unwrap().push(record);
    }

    pub fn unpublish_all(&self) {
        self.state.keys.lock().unwrap().clear();
    }

    pub fn reply_to_token_requests(&self, status: u16, body: Value) {
        *self.state.token_reply.lock().unwrap() = Some((status, body));
    }

    pub fn token_requests(&self) -> Vec<HashMap<String, String>> {
        self.state.token_requests.lock().unwrap().clone()
    }

    pub fn jwks_hits(&self) -> usize {
        self.state.jwks_hits.load(Ordering::SeqCst)
    }

    pub fn public_key_hits(&self) -> usize {
        self.state.public_key_hits.load(Ordering::SeqCst)
    }

    /// Auth configuration pointing at this identity provider.
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            realm: REALM.to_owned(),
            issuer: ISSUER.to_owned(),
            client_id: CLIENT_ID.to_owned(),
            client_secret: Some("client-secret".to_owned()),
            jwks_url: self.jwks_url(),
            public_key_url: Some(self.public_key_url()),
            token_url: self.token_url(),
            http_timeout_seconds: 2,
            ..AuthConfig::default()
        }
    }
}

async fn jwks(State(state): State<IdpState>) -> Json<Value> {
    state.jwks_hits.fetch_add(1, Ordering::SeqCst);
    let keys = state.keys.lock().unwrap().clone();
    Json(json!({ "keys": keys }))
}

async fn public_key(
    State(state): State<IdpState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.public_key_hits.fetch_add(1, Ordering::SeqCst);
    let pem = params
        .get("kid")
        .and_then(|kid| state.pems.lock().unwrap().get(kid).cloned());
    match pem {
        Some(pem) => Json(json!({ "publicKey": pem })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn token(
    State(state): State<IdpState>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.token_requests.lock().unwrap().push(form);
    let reply = state.token_reply.lock().unwrap().clone();
    match reply {
        Some((status, body)) => (
            StatusCode::from_u16(status).unwrap(),
            Json(body),
        )
            .into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

/// Claims of a valid token for `subject`.
pub fn claims(subject: &str, roles: &[&str]) -> Value {
    json!({
        "sub": subject,
        "iss": ISSUER,
        "aud": CLIENT_ID,
        "exp": chrono::Utc::now().timestamp() + 600,
        "roles": roles,
    })
}

/// Sign `claims` with an RSA private key, naming `kid` in the header.
pub fn mint(kid: &str, private_pem: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_owned());
    let key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

/// A valid token for `subject`, signed with the primary key.
pub fn token_for(subject: &str, roles: &[&str]) -> String {
    mint(PRIMARY_KID, PRIMARY_PRIVATE, &claims(subject, roles))
}

/// Application state over a fresh in-memory repository.
pub fn app_state(auth: &AuthConfig) -> (AppState, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::new());
    let state = AppState::from_config(auth, UseCases::new(&repository)).unwrap();
    (state, repository)
}
