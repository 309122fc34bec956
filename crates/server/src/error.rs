use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use restvoice_core::{RepositoryError, UseCaseError};

/// Errors that can occur when running the Restvoice server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// No representation matches the request's `Accept` header.
    #[error("not acceptable: {0}")]
    NotAcceptable(String),
}

impl From<UseCaseError> for ServerError {
    fn from(err: UseCaseError) -> Self {
        match err {
            UseCaseError::Validation(msg) => Self::BadRequest(msg),
            UseCaseError::InvalidState(msg) => Self::Conflict(msg),
            UseCaseError::Repository(e @ RepositoryError::NotFound { .. }) => {
                Self::NotFound(e.to_string())
            }
            UseCaseError::Repository(RepositoryError::Conflict(msg)) => Self::Conflict(msg),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::NotAcceptable(msg) => (StatusCode::NOT_ACCEPTABLE, msg.clone()),
            Self::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            Self::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
