use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::activity::Activity;
use crate::booking::Booking;
use crate::error::{RepositoryError, UseCaseError};
use crate::invoice::{Invoice, InvoiceStatus};
use crate::rate::Rate;

#[async_trait]
pub trait CreateInvoicePort: Send + Sync {
    async fn create_invoice(&self, invoice: Invoice) -> Result<Invoice, RepositoryError>;
}

#[async_trait]
pub trait GetInvoicePort: Send + Sync {
    /// Load an invoice, embedding its bookings when `with_bookings` is set.
    async fn get_invoice(&self, id: u64, with_bookings: bool) -> Option<Invoice>;
}

#[async_trait]
pub trait UpdateInvoicePort: Send + Sync {
    async fn activity_by_id(&self, user_id: &str, activity_id: u64) -> Option<Activity>;
    async fn bookings_by_invoice_id(&self, invoice_id: u64) -> Vec<Booking>;
    async fn rate_by_project_and_activity(&self, project_id: u64, activity_id: u64)
    -> Option<Rate>;
    async fn update_invoice(&self, invoice: Invoice) -> Result<(), RepositoryError>;
}

/// Opens a new invoice for a customer.
#[derive(Clone)]
pub struct CreateInvoice {
    port: Arc<dyn CreateInvoicePort>,
}

impl CreateInvoice {
    pub fn new(port: Arc<dyn CreateInvoicePort>) -> Self {
        Self { port }
    }

    /// The new invoice is always `open`, without positions or bookings,
    /// whatever the caller supplied.
    pub async fn run(&self, customer_id: u64, invoice: Invoice) -> Result<Invoice, UseCaseError> {
        if !(1..=12).contains(&invoice.month) {
            return Err(UseCaseError::Validation(format!(
                "month must be between 1 and 12, got {}",
                invoice.month
            )));
        }
        let invoice = Invoice {
            customer_id,
            status: InvoiceStatus::Open,
            updated: Utc::now(),
            ..Invoice::new(customer_id, invoice.month, invoice.year)
        };
        Ok(self.port.create_invoice(invoice).await?)
    }
}

/// Reads an invoice, optionally expanding sub-resources.
#[derive(Clone)]
pub struct GetInvoice {
    port: Arc<dyn GetInvoicePort>,
}

impl GetInvoice {
    pub fn new(port: Arc<dyn GetInvoicePort>) -> Self {
        Self { port }
    }

    /// `expand` is a comma separated list of sub-resources; only
    /// `bookings` is recognised.
    pub async fn run(&self, id: u64, expand: Option<&str>) -> Result<Invoice, UseCaseError> {
        let with_bookings = expand.is_some_and(|e| e.split(',').any(|s| s.trim() == "bookings"));
        self.port
            .get_invoice(id, with_bookings)
            .await
            .ok_or_else(|| RepositoryError::not_found("invoice", id).into())
    }
}

/// Persists an invoice and runs the aggregation pass when it is marked
/// ready for aggregation.
#[derive(Clone)]
pub struct UpdateInvoice {
    port: Arc<dyn UpdateInvoicePort>,
}

impl UpdateInvoice {
    pub fn new(port: Arc<dyn UpdateInvoicePort>) -> Self {
        Self { port }
    }

    /// Returns the invoice as stored.
    ///
    /// Any status other than `ready for aggregation` is stored as given.
    pub async fn run(&self, user_id: &str, mut invoice: Invoice) -> Result<Invoice, UseCaseError> {
        if invoice.is_ready_for_aggregation() {
            self.aggregate(user_id, &mut invoice).await;
        } else {
            debug!(invoice_id = invoice.id, status = %invoice.status, "storing invoice");
        }
        invoice.bookings.clear();
        self.port.update_invoice(invoice.clone()).await?;
        Ok(invoice)
    }

    /// Positions are recomputed from the bookings alone on every pass.
    async fn aggregate(&self, user_id: &str, invoice: &mut Invoice) {
        invoice.positions.clear();
        let bookings = self.port.bookings_by_invoice_id(invoice.id).await;
        for booking in &bookings {
            let rate = self
                .port
                .rate_by_project_and_activity(booking.project_id, booking.activity_id)
                .await
                .unwrap_or_else(|| {
                    warn!(
                        invoice_id = invoice.id,
                        project_id = booking.project_id,
                        activity_id = booking.activity_id,
                        "no rate for booking, pricing at zero"
                    );
                    Rate::default()
                });
            let activity = self
                .port
                .activity_by_id(user_id, booking.activity_id)
                .await
                .unwrap_or_else(|| {
                    warn!(
                        invoice_id = invoice.id,
                        activity_id = booking.activity_id,
                        "unknown activity for booking, using empty name"
                    );
                    Activity::default()
                });
            invoice.add_position(booking.project_id, &activity.name, booking.hours, rate.price);
        }
        invoice.status = InvoiceStatus::PaymentExpected;
        invoice.updated = Utc::now();
        info!(
            invoice_id = invoice.id,
            bookings = bookings.len(),
            projects = invoice.positions.len(),
            "invoice aggregated"
        );
    }
}
