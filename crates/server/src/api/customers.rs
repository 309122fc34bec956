use axum::extract::{Extension, Json, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};

use restvoice_core::Customer;

use super::schemas::ErrorResponse;
use super::{AppState, created};
use crate::auth::Claims;
use crate::error::ServerError;

/// `GET /customers` -- every customer; requires the `ADMIN` role.
#[utoipa::path(
    get,
    path = "/customers",
    tag = "Customers",
    summary = "List all customers",
    description = "Returns the customers of all users. Only callers with the ADMIN role may list them.",
    responses(
        (status = 200, description = "All customers", body = [Customer]),
        (status = 401, description = "Missing or invalid token, or missing ADMIN role", body = ErrorResponse),
        (status = 403, description = "Missing ADMIN role (when configured)", body = ErrorResponse),
    )
)]
pub async fn list_customers(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.usecases.customers.run().await)
}

/// `POST /customers` -- create a customer owned by the caller.
#[utoipa::path(
    post,
    path = "/customers",
    tag = "Customers",
    summary = "Create a customer",
    request_body(content = Customer, description = "Customer to create; id and userId are assigned"),
    responses(
        (status = 201, description = "Customer created", body = Customer),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn create_customer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    uri: Uri,
    Json(customer): Json<Customer>,
) -> Result<Response, ServerError> {
    let customer = state
        .usecases
        .create_customer
        .run(&claims.subject, customer)
        .await?;
    Ok(created(&uri, customer.id, customer))
}
