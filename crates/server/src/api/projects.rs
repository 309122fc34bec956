//! Project and rate endpoints nested under a customer.

use axum::extract::{Json, Path, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};

use restvoice_core::{Project, Rate};

use super::schemas::ErrorResponse;
use super::{AppState, created};
use crate::error::ServerError;

/// `GET /customers/{customer_id}/projects`
#[utoipa::path(
    get,
    path = "/customers/{customer_id}/projects",
    tag = "Projects",
    summary = "List projects of a customer",
    params(("customer_id" = u64, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Projects of the customer", body = [Project]),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn list_projects(
    State(state): State<AppState>,
    Path(customer_id): Path<u64>,
) -> impl IntoResponse {
    Json(state.usecases.projects.run(customer_id).await)
}

/// `POST /customers/{customer_id}/projects`
#[utoipa::path(
    post,
    path = "/customers/{customer_id}/projects",
    tag = "Projects",
    summary = "Create a project",
    params(("customer_id" = u64, Path, description = "Customer id")),
    request_body(content = Project, description = "Project to create"),
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Unknown customer", body = ErrorResponse),
    )
)]
pub async fn create_project(
    State(state): State<AppState>,
    Path(customer_id): Path<u64>,
    uri: Uri,
    Json(project): Json<Project>,
) -> Result<Response, ServerError> {
    let project = state
        .usecases
        .create_project
        .run(customer_id, project)
        .await?;
    Ok(created(&uri, project.id, project))
}

/// `POST /customers/{customer_id}/projects/{project_id}/rates`
///
/// A rate is addressed by its activity, so the `Location` ends in the
/// activity id. Posting a rate for the same activity again replaces it.
#[utoipa::path(
    post,
    path = "/customers/{customer_id}/projects/{project_id}/rates",
    tag = "Projects",
    summary = "Set the rate of an activity on a project",
    params(
        ("customer_id" = u64, Path, description = "Customer id"),
        ("project_id" = u64, Path, description = "Project id"),
    ),
    request_body(content = Rate, description = "Hourly price for an activity"),
    responses(
        (status = 201, description = "Rate stored", body = Rate),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Unknown project", body = ErrorResponse),
    )
)]
pub async fn create_rate(
    State(state): State<AppState>,
    Path((_customer_id, project_id)): Path<(u64, u64)>,
    uri: Uri,
    Json(rate): Json<Rate>,
) -> Result<Response, ServerError> {
    let rate = state.usecases.create_rate.run(project_id, rate).await?;
    Ok(created(&uri, rate.activity_id, rate))
}
