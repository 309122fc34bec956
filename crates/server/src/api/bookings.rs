use axum::extract::{Json, Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::Response;

use restvoice_core::Booking;

use super::schemas::ErrorResponse;
use super::{AppState, created};
use crate::error::ServerError;

/// `POST /customers/{customer_id}/invoices/{invoice_id}/bookings`
#[utoipa::path(
    post,
    path = "/customers/{customer_id}/invoices/{invoice_id}/bookings",
    tag = "Bookings",
    summary = "Book hours on an invoice",
    description = "Records hours of an activity on a project. Only open invoices accept bookings.",
    params(
        ("customer_id" = u64, Path, description = "Customer id"),
        ("invoice_id" = u64, Path, description = "Invoice id"),
    ),
    request_body(content = Booking, description = "Booked hours"),
    responses(
        (status = 201, description = "Booking created", body = Booking),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Invoice not owned by caller", body = ErrorResponse),
        (status = 409, description = "Invoice no longer open", body = ErrorResponse),
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Path((_customer_id, invoice_id)): Path<(u64, u64)>,
    uri: Uri,
    Json(booking): Json<Booking>,
) -> Result<Response, ServerError> {
    let booking = state
        .usecases
        .create_booking
        .run(invoice_id, booking)
        .await?;
    Ok(created(&uri, booking.id, booking))
}

/// `DELETE /customers/{customer_id}/invoices/{invoice_id}/bookings/{booking_id}`
#[utoipa::path(
    delete,
    path = "/customers/{customer_id}/invoices/{invoice_id}/bookings/{booking_id}",
    tag = "Bookings",
    summary = "Delete a booking",
    params(
        ("customer_id" = u64, Path, description = "Customer id"),
        ("invoice_id" = u64, Path, description = "Invoice id"),
        ("booking_id" = u64, Path, description = "Booking id"),
    ),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Invoice not owned by caller", body = ErrorResponse),
        (status = 404, description = "Unknown booking", body = ErrorResponse),
        (status = 409, description = "Invoice no longer open", body = ErrorResponse),
    )
)]
pub async fn delete_booking(
    State(state): State<AppState>,
    Path((_customer_id, invoice_id, booking_id)): Path<(u64, u64, u64)>,
) -> Result<StatusCode, ServerError> {
    state
        .usecases
        .delete_booking
        .run(invoice_id, booking_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
