//! Invoice endpoints.
//!
//! Updating an invoice to `ready for aggregation` triggers the aggregation
//! of its bookings into priced positions.

use axum::extract::{Extension, Json, Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use utoipa::IntoParams;

use restvoice_core::Invoice;

use super::hal::{HAL_JSON, HalInvoice};
use super::schemas::ErrorResponse;
use super::{AppState, created};
use crate::auth::Claims;
use crate::error::ServerError;

const JSON: &str = "application/json";

/// Query parameters for reading an invoice.
#[derive(Debug, Deserialize, IntoParams)]
pub struct InvoiceParams {
    /// Comma separated sub-resources to embed; only `bookings` is known.
    #[param(example = "bookings")]
    pub expand: Option<String>,
}

/// `POST /customers/{customer_id}/invoices` -- open a new invoice.
#[utoipa::path(
    post,
    path = "/customers/{customer_id}/invoices",
    tag = "Invoices",
    summary = "Create an invoice",
    description = "Creates an open invoice for the given month. Status and positions in the body are ignored.",
    params(("customer_id" = u64, Path, description = "Customer id")),
    request_body(content = Invoice, description = "Month and year of the invoice"),
    responses(
        (status = 201, description = "Invoice created", body = Invoice),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Unknown customer", body = ErrorResponse),
    )
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    Path(customer_id): Path<u64>,
    uri: Uri,
    Json(invoice): Json<Invoice>,
) -> Result<Response, ServerError> {
    let invoice = state
        .usecases
        .create_invoice
        .run(customer_id, invoice)
        .await?;
    Ok(created(&uri, invoice.id, invoice))
}

/// `GET /customers/{customer_id}/invoices/{invoice_id}` -- HAL invoice.
#[utoipa::path(
    get,
    path = "/customers/{customer_id}/invoices/{invoice_id}",
    tag = "Invoices",
    summary = "Get an invoice",
    description = "Returns the invoice as HAL with links for the operations its status allows. Only JSON representations are offered.",
    params(
        ("customer_id" = u64, Path, description = "Customer id"),
        ("invoice_id" = u64, Path, description = "Invoice id"),
        InvoiceParams,
    ),
    responses(
        (status = 200, description = "The invoice", body = HalInvoice, content_type = "application/hal+json"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Invoice not owned by caller", body = ErrorResponse),
        (status = 404, description = "Unknown invoice", body = ErrorResponse),
        (status = 406, description = "No acceptable representation", body = ErrorResponse),
    )
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    Path((customer_id, invoice_id)): Path<(u64, u64)>,
    Query(params): Query<InvoiceParams>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let content_type = negotiate(&headers)?;
    let invoice = state
        .usecases
        .get_invoice
        .run(invoice_id, params.expand.as_deref())
        .await?;
    ensure_customer(&invoice, customer_id)?;

    let mut response = Json(HalInvoice::new(invoice)).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    Ok(response)
}

/// `PUT /customers/{customer_id}/invoices/{invoice_id}` -- store an invoice.
#[utoipa::path(
    put,
    path = "/customers/{customer_id}/invoices/{invoice_id}",
    tag = "Invoices",
    summary = "Update an invoice",
    description = "Stores the invoice. Setting the status to `ready for aggregation` aggregates all bookings into positions and moves the invoice on to `payment expected`.",
    params(
        ("customer_id" = u64, Path, description = "Customer id"),
        ("invoice_id" = u64, Path, description = "Invoice id"),
    ),
    request_body(content = Invoice, description = "New state of the invoice"),
    responses(
        (status = 204, description = "Invoice stored"),
        (status = 400, description = "Malformed invoice", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Invoice not owned by caller", body = ErrorResponse),
        (status = 404, description = "Unknown invoice", body = ErrorResponse),
    )
)]
pub async fn update_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((customer_id, invoice_id)): Path<(u64, u64)>,
    Json(mut invoice): Json<Invoice>,
) -> Result<StatusCode, ServerError> {
    let stored = state.usecases.get_invoice.run(invoice_id, None).await?;
    ensure_customer(&stored, customer_id)?;

    // Identity, ownership and positions are not part of the update.
    invoice.id = stored.id;
    invoice.customer_id = stored.customer_id;
    invoice.positions = stored.positions;
    invoice.updated = stored.updated;
    if invoice.month == 0 {
        invoice.month = stored.month;
    }
    if invoice.year == 0 {
        invoice.year = stored.year;
    }
    state
        .usecases
        .update_invoice
        .run(&claims.subject, invoice)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// An invoice addressed under another customer does not exist.
fn ensure_customer(invoice: &Invoice, customer_id: u64) -> Result<(), ServerError> {
    if invoice.customer_id == customer_id {
        Ok(())
    } else {
        Err(ServerError::NotFound(format!(
            "invoice {} not found for customer {customer_id}",
            invoice.id
        )))
    }
}

/// Pick the response media type from `Accept`. A missing header accepts
/// anything.
fn negotiate(headers: &HeaderMap) -> Result<&'static str, ServerError> {
    let Some(accept) = headers.get(header::ACCEPT) else {
        return Ok(HAL_JSON);
    };
    let accept = accept
        .to_str()
        .map_err(|_| ServerError::BadRequest("invalid Accept header".to_owned()))?;

    let mut json = false;
    for media in accept.split(',') {
        let media = media.split(';').next().unwrap_or_default().trim();
        match media {
            "application/hal+json" | "*/*" | "application/*" => return Ok(HAL_JSON),
            "application/json" => json = true,
            _ => {}
        }
    }
    if json {
        Ok(JSON)
    } else {
        Err(ServerError::NotAcceptable(format!(
            "no representation for {accept:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn hal_is_preferred() {
        assert_eq!(negotiate(&HeaderMap::new()).unwrap(), HAL_JSON);
        assert_eq!(negotiate(&accept("application/hal+json")).unwrap(), HAL_JSON);
        assert_eq!(
            negotiate(&accept("application/json;q=0.8, application/hal+json")).unwrap(),
            HAL_JSON
        );
        assert_eq!(negotiate(&accept("*/*")).unwrap(), HAL_JSON);
    }

    #[test]
    fn plain_json_is_served_as_json() {
        assert_eq!(negotiate(&accept("application/json")).unwrap(), JSON);
    }

    #[test]
    fn other_media_types_are_not_acceptable() {
        for value in ["application/pdf", "text/html", "application/xml;q=0.9"] {
            assert!(
                matches!(negotiate(&accept(value)), Err(ServerError::NotAcceptable(_))),
                "{value}"
            );
        }
    }
}
