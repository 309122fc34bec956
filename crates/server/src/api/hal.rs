//! HAL representation of an invoice.
//!
//! Links are derived from [`Invoice::operations`], so a client only sees
//! the transitions the invoice's current status allows.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use restvoice_core::{Booking, Invoice, Operation};

pub const HAL_JSON: &str = "application/hal+json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Link {
    pub href: String,
}

/// Sub-resources embedded on request (`?expand=bookings`).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Embedded {
    pub bookings: Vec<Booking>,
}

/// An invoice decorated with `_links` and, optionally, `_embedded`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HalInvoice {
    #[serde(flatten)]
    pub invoice: Invoice,
    #[serde(rename = "_links")]
    pub links: BTreeMap<String, Link>,
    #[serde(rename = "_embedded", skip_serializing_if = "Option::is_none")]
    pub embedded: Option<Embedded>,
}

impl HalInvoice {
    pub fn new(mut invoice: Invoice) -> Self {
        let base = format!(
            "/customers/{}/invoices/{}",
            invoice.customer_id, invoice.id
        );
        let mut links = BTreeMap::new();
        links.insert("self".to_owned(), Link { href: base.clone() });
        for op in invoice.operations() {
            links.insert(op.rel().to_owned(), Link { href: href(&base, *op) });
        }

        let bookings = std::mem::take(&mut invoice.bookings);
        let embedded = (!bookings.is_empty()).then_some(Embedded { bookings });
        Self {
            invoice,
            links,
            embedded,
        }
    }
}

/// Target of an operation. Status transitions are a `PUT` on the invoice
/// itself; bookings live in the invoice's sub-collection.
fn href(base: &str, op: Operation) -> String {
    match op {
        Operation::Book => format!("{base}/bookings"),
        Operation::Bookings => format!("{base}?expand=bookings"),
        Operation::Charge | Operation::Cancel | Operation::Payment | Operation::Archive => {
            base.to_owned()
        }
    }
}
