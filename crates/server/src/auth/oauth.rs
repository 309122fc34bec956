use std::collections::HashMap;
use std::time::Duration;

use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::gate::Challenge;
use crate::config::AuthConfig;

/// `userState` the identity provider reports for a completed login.
const AUTHENTICATED: &str = "Authenticated";

/// Token issued by the identity provider for an access code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthInfo {
    pub access_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    pub token_type: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("token endpoint unreachable: {0}")]
    Transport(String),

    #[error("token endpoint answered {0}")]
    Status(u16),

    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

/// Exchanges an OAuth access code for a bearer token at the identity
/// provider's token endpoint.
#[derive(Debug, Clone)]
pub struct OAuthExchange {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    grant_type: String,
    redirect_uri: String,
}

impl OAuthExchange {
    pub fn new(config: &AuthConfig) -> Result<Self, OAuthError> {
        let timeout = Duration::from_secs(config.http_timeout_seconds);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| OAuthError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone().unwrap_or_default(),
            grant_type: config.grant_type.clone(),
            redirect_uri: config.redirect_uri.clone(),
        })
    }

    /// Post `code` to the token endpoint and validate the answer.
    pub async fn exchange(&self, code: &str) -> Result<AuthInfo, OAuthError> {
        let form = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", self.grant_type.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        let response = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| OAuthError::Transport(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(url = %self.token_url, status = status.as_u16(), "access code exchange refused");
            return Err(OAuthError::Status(status.as_u16()));
        }

        let info: AuthInfo = response
            .json()
            .await
            .map_err(|e| OAuthError::InvalidResponse(e.to_string()))?;
        validate(&info)?;
        info!(user_id = %info.user_id, expires_in = info.expires_in, "access code exchanged");
        Ok(info)
    }
}

fn validate(info: &AuthInfo) -> Result<(), OAuthError> {
    if info.token_type != "Bearer" {
        return Err(OAuthError::InvalidResponse(format!(
            "token_type {:?}",
            info.token_type
        )));
    }
    if info.expires_in < 0 {
        return Err(OAuthError::InvalidResponse(format!(
            "expires_in {}",
            info.expires_in
        )));
    }
    if info.access_token.is_empty() {
        return Err(OAuthError::InvalidResponse("empty access_token".to_owned()));
    }
    if info.user_id.is_empty() {
        return Err(OAuthError::InvalidResponse("empty userId".to_owned()));
    }
    Ok(())
}

/// Middleware for the identity provider's redirect: only completed logins
/// carrying an access code reach the exchange.
pub async fn require_code_grant(
    State(challenge): State<Challenge>,
    Query(params): Query<HashMap<String, String>>,
    req: Request,
    next: Next,
) -> Response {
    let has_code = params.get("code").is_some_and(|c| !c.is_empty());
    let authenticated = params.get("userState").map(String::as_str) == Some(AUTHENTICATED);
    if !has_code || !authenticated {
        warn!(has_code, authenticated, "redirect without completed login");
        return challenge.respond(StatusCode::NOT_ACCEPTABLE, "access code grant required");
    }
    next.run(req).await
}
