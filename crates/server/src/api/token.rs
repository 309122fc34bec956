use std::collections::HashMap;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use super::AppState;
use super::schemas::ErrorResponse;
use crate::auth::AuthInfo;

/// `GET /auth/token` -- redirect target of the identity provider's login.
///
/// Exchanges the access code for a bearer token and hands it to the client.
#[utoipa::path(
    get,
    path = "/auth/token",
    tag = "Auth",
    summary = "Exchange an access code",
    description = "Exchanges the access code of a completed login for a bearer token at the identity provider.",
    params(
        ("code" = String, Query, description = "Access code issued by the identity provider"),
        ("userState" = String, Query, description = "Must be `Authenticated`"),
    ),
    responses(
        (status = 200, description = "Token issued", body = AuthInfo),
        (status = 401, description = "The identity provider refused the code", body = ErrorResponse),
        (status = 406, description = "Login not completed or code missing", body = ErrorResponse),
    )
)]
pub async fn exchange_token(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let code = params.get("code").map(String::as_str).unwrap_or_default();
    match state.oauth.exchange(code).await {
        Ok(info) => (StatusCode::OK, Json(info)).into_response(),
        Err(e) => {
            warn!(error = %e, "access code exchange failed");
            state
                .challenge
                .respond(StatusCode::UNAUTHORIZED, "access code exchange failed")
        }
    }
}
