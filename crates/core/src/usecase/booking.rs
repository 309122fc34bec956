use std::sync::Arc;

use async_trait::async_trait;

use crate::booking::Booking;
use crate::error::{RepositoryError, UseCaseError};
use crate::invoice::Invoice;

#[async_trait]
pub trait CreateBookingPort: Send + Sync {
    async fn invoice(&self, id: u64) -> Option<Invoice>;
    async fn create_booking(&self, booking: Booking) -> Result<Booking, RepositoryError>;
}

#[async_trait]
pub trait DeleteBookingPort: Send + Sync {
    async fn invoice(&self, id: u64) -> Option<Invoice>;
    async fn delete_booking(&self, invoice_id: u64, booking_id: u64)
    -> Result<(), RepositoryError>;
}

/// Records work on an open invoice.
#[derive(Clone)]
pub struct CreateBooking {
    port: Arc<dyn CreateBookingPort>,
}

impl CreateBooking {
    pub fn new(port: Arc<dyn CreateBookingPort>) -> Self {
        Self { port }
    }

    pub async fn run(&self, invoice_id: u64, mut booking: Booking) -> Result<Booking, UseCaseError> {
        if !booking.hours.is_finite() || booking.hours <= 0.0 {
            return Err(UseCaseError::Validation(format!(
                "hours must be a positive number, got {}",
                booking.hours
            )));
        }
        ensure_open(self.port.invoice(invoice_id).await, invoice_id)?;
        booking.invoice_id = invoice_id;
        Ok(self.port.create_booking(booking).await?)
    }
}

/// Removes a booking from an open invoice.
#[derive(Clone)]
pub struct DeleteBooking {
    port: Arc<dyn DeleteBookingPort>,
}

impl DeleteBooking {
    pub fn new(port: Arc<dyn DeleteBookingPort>) -> Self {
        Self { port }
    }

    pub async fn run(&self, invoice_id: u64, booking_id: u64) -> Result<(), UseCaseError> {
        ensure_open(self.port.invoice(invoice_id).await, invoice_id)?;
        Ok(self.port.delete_booking(invoice_id, booking_id).await?)
    }
}

fn ensure_open(invoice: Option<Invoice>, invoice_id: u64) -> Result<(), UseCaseError> {
    let invoice = invoice.ok_or_else(|| RepositoryError::not_found("invoice", invoice_id))?;
    if !invoice.is_open() {
        return Err(UseCaseError::InvalidState(format!(
            "invoice {invoice_id} is {}, bookings can only change while it is open",
            invoice.status
        )));
    }
    Ok(())
}
