use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use regex::Regex;
use tower::{Layer, Service};
use tracing::{debug, warn};

use restvoice_core::usecase::Ownership;

use super::claims::{Claims, Role};
use super::verifier::TokenVerifier;
use crate::api::AppState;

/// `Authorization` values carrying exactly one bearer token.
static BEARER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Bearer (\S+)$").expect("bearer regex is valid"));

/// Authentication scheme announced in `WWW-Authenticate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Bearer,
    Basic,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer => f.write_str("Bearer"),
            Self::Basic => f.write_str("Basic"),
        }
    }
}

/// `WWW-Authenticate` challenge attached to 401 and 406 rejections.
#[derive(Debug, Clone)]
pub struct Challenge {
    scheme: Scheme,
    realm: Arc<str>,
}

impl Challenge {
    pub fn bearer(realm: &str) -> Self {
        Self {
            scheme: Scheme::Bearer,
            realm: realm.into(),
        }
    }

    pub fn basic(realm: &str) -> Self {
        Self {
            scheme: Scheme::Basic,
            realm: realm.into(),
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// The header value, e.g. `Bearer realm="restvoice.org"`.
    pub fn header_value(&self) -> String {
        format!("{} realm=\"{}\"", self.scheme, self.realm)
    }

    /// Terminal response with a JSON error body and this challenge.
    pub fn respond(&self, status: StatusCode, message: &str) -> Response {
        let body = serde_json::json!({ "error": message });
        let mut response = (status, axum::Json(body)).into_response();
        if let Ok(value) = HeaderValue::from_str(&self.header_value()) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, value);
        }
        response
    }
}

/// Extract the bearer token from the `Authorization` headers.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::AUTHORIZATION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| BEARER.captures(v))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Tower layer that verifies the bearer token and stores [`Claims`] in the
/// request extensions.
#[derive(Clone)]
pub struct AuthLayer {
    verifier: Option<Arc<TokenVerifier>>,
    challenge: Challenge,
}

impl AuthLayer {
    /// Without a verifier every request runs as [`Claims::anonymous`].
    pub fn new(verifier: Option<Arc<TokenVerifier>>, challenge: Challenge) -> Self {
        Self {
            verifier,
            challenge,
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            verifier: self.verifier.clone(),
            challenge: self.challenge.clone(),
        }
    }
}

/// Tower service that authenticates requests.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    verifier: Option<Arc<TokenVerifier>>,
    challenge: Challenge,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let verifier = self.verifier.clone();
        let challenge = self.challenge.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(verifier) = verifier else {
                req.extensions_mut().insert(Claims::anonymous());
                return inner.call(req).await;
            };

            let Some(token) = bearer_token(req.headers()) else {
                debug!(path = %req.uri().path(), "request without bearer token");
                return Ok(challenge.respond(StatusCode::UNAUTHORIZED, "missing bearer token"));
            };

            let verified = verifier.verify(token).await;
            match verified {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    inner.call(req).await
                }
                Err(e) => {
                    warn!(path = %req.uri().path(), error = %e, "token rejected");
                    Ok(challenge.respond(StatusCode::UNAUTHORIZED, &e.to_string()))
                }
            }
        })
    }
}

/// Tower layer that requires a role in the caller's [`Claims`].
#[derive(Clone)]
pub struct RoleLayer {
    role: Role,
    insufficient: StatusCode,
    challenge: Challenge,
}

impl RoleLayer {
    /// `insufficient` is the status for authenticated callers that lack the
    /// role, either 401 or 403.
    pub fn new(role: Role, insufficient: StatusCode, challenge: Challenge) -> Self {
        Self {
            role,
            insufficient,
            challenge,
        }
    }
}

impl<S> Layer<S> for RoleLayer {
    type Service = RoleMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RoleMiddleware {
            inner,
            layer: self.clone(),
        }
    }
}

/// Tower service that rejects callers without the required role.
#[derive(Clone)]
pub struct RoleMiddleware<S> {
    inner: S,
    layer: RoleLayer,
}

impl<S> Service<Request<Body>> for RoleMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let RoleLayer {
            role,
            insufficient,
            challenge,
        } = self.layer.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(claims) = req.extensions().get::<Claims>() else {
                return Ok(challenge.respond(StatusCode::UNAUTHORIZED, "not authenticated"));
            };
            if !claims.has_role(role) {
                warn!(subject = %claims.subject, %role, "caller lacks required role");
                let message = format!("role {role} required");
                return Ok(if insufficient == StatusCode::UNAUTHORIZED {
                    challenge.respond(insufficient, &message)
                } else {
                    rejection(insufficient, &message)
                });
            }
            inner.call(req).await
        })
    }
}

/// Middleware that requires the caller to own the invoice named by the
/// `invoice_id` path parameter.
///
/// Unknown invoices are rejected the same way as foreign ones so that the
/// answer does not reveal which ids exist.
pub async fn require_ownership(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(invoice_id) = params.get("invoice_id").and_then(|id| id.parse::<u64>().ok()) else {
        return rejection(StatusCode::BAD_REQUEST, "invalid invoice id");
    };
    let Some(subject) = req.extensions().get::<Claims>().map(|c| c.subject.clone()) else {
        return state
            .challenge
            .respond(StatusCode::UNAUTHORIZED, "not authenticated");
    };

    let outcome = state.usecases.ownership.run(invoice_id, &subject).await;
    if outcome == Ownership::Owner {
        return next.run(req).await;
    }
    warn!(%subject, invoice_id, ?outcome, "invoice access denied");
    rejection(StatusCode::FORBIDDEN, "invoice not owned by caller")
}

/// JSON error without a challenge, for refusals that re-authenticating
/// cannot fix.
fn rejection(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for v in values {
            map.append(header::AUTHORIZATION, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn extracts_single_bearer_token() {
        assert_eq!(bearer_token(&headers(&["Bearer abc.def.ghi"])), Some("abc.def.ghi"));
    }

    #[test]
    fn rejects_malformed_authorization() {
        for value in ["bearer abc", "Bearer", "Bearer  abc", "Bearer abc def", "Basic abc"] {
            assert_eq!(bearer_token(&headers(&[value])), None, "{value:?}");
        }
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn picks_bearer_among_several_headers() {
        assert_eq!(
            bearer_token(&headers(&["Basic dXNlcjpwdw==", "Bearer tok"])),
            Some("tok")
        );
    }

    #[test]
    fn challenge_header_names_scheme_and_realm() {
        assert_eq!(
            Challenge::bearer("restvoice.org").header_value(),
            "Bearer realm=\"restvoice.org\""
        );
        assert_eq!(
            Challenge::basic("restvoice.org").header_value(),
            "Basic realm=\"restvoice.org\""
        );
    }

    #[test]
    fn challenge_response_carries_header() {
        let response = Challenge::bearer("r").respond(StatusCode::UNAUTHORIZED, "nope");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            "Bearer realm=\"r\""
        );
    }
}
