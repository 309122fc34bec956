//! Invoices, their lifecycle status and aggregated positions.
//!
//! An invoice starts out `open` and collects bookings. Once the owner marks
//! it `ready for aggregation`, the update use case converts every booking
//! into a priced [`Position`] keyed by project and activity name and moves
//! the invoice on to `payment expected`. All later transitions are plain
//! status changes.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::booking::Booking;

/// Positions of an invoice: project id to activity name to accumulator.
pub type Positions = BTreeMap<u64, BTreeMap<String, Position>>;

/// Lifecycle status of an invoice.
///
/// Serialized as the literal strings used on the wire, e.g.
/// `"ready for aggregation"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum InvoiceStatus {
    #[default]
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "ready for aggregation")]
    ReadyForAggregation,
    #[serde(rename = "payment expected")]
    PaymentExpected,
    #[serde(rename = "paid")]
    Paid,
    #[serde(rename = "archived")]
    Archived,
    #[serde(rename = "revoked")]
    Revoked,
}

impl InvoiceStatus {
    /// The wire representation of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::ReadyForAggregation => "ready for aggregation",
            Self::PaymentExpected => "payment expected",
            Self::Paid => "paid",
            Self::Archived => "archived",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hypermedia operation that is available on an invoice in its current
/// status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Book,
    Bookings,
    Charge,
    Cancel,
    Payment,
    Archive,
}

impl Operation {
    /// Link relation name used in HAL `_links`.
    pub fn rel(self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Bookings => "bookings",
            Self::Charge => "charge",
            Self::Cancel => "cancel",
            Self::Payment => "payment",
            Self::Archive => "archive",
        }
    }
}

/// Hours and price accumulated for one (project, activity) pair.
///
/// `price` is the sum of `hours * rate` over all contributing bookings, so
/// adding the same booking twice doubles both fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "PascalCase")]
pub struct Position {
    pub hours: f32,
    pub price: f32,
}

/// An invoice for one customer and one month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub month: u32,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default)]
    pub customer_id: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub positions: Positions,
    /// Only populated when bookings are explicitly expanded.
    #[serde(skip)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub updated: DateTime<Utc>,
}

impl Invoice {
    /// Create an open invoice for a customer.
    #[must_use]
    pub fn new(customer_id: u64, month: u32, year: i32) -> Self {
        Self {
            customer_id,
            month,
            year,
            ..Self::default()
        }
    }

    /// Accumulate `hours` at `rate` into the position for
    /// `(project_id, activity)`, creating the position if absent.
    pub fn add_position(&mut self, project_id: u64, activity: &str, hours: f32, rate: f32) {
        let position = self
            .positions
            .entry(project_id)
            .or_default()
            .entry(activity.to_owned())
            .or_default();
        position.hours += hours;
        position.price += hours * rate;
    }

    /// Returns `true` if an update with this invoice triggers aggregation.
    pub fn is_ready_for_aggregation(&self) -> bool {
        self.status == InvoiceStatus::ReadyForAggregation
    }

    /// Returns `true` while bookings may still be added or removed.
    pub fn is_open(&self) -> bool {
        self.status == InvoiceStatus::Open
    }

    /// Operations a client may follow from the current status.
    pub fn operations(&self) -> &'static [Operation] {
        match self.status {
            InvoiceStatus::Open => &[
                Operation::Book,
                Operation::Bookings,
                Operation::Charge,
                Operation::Cancel,
            ],
            InvoiceStatus::ReadyForAggregation => &[Operation::Bookings],
            InvoiceStatus::PaymentExpected => &[Operation::Bookings, Operation::Payment],
            InvoiceStatus::Paid | InvoiceStatus::Revoked => &[Operation::Archive],
            InvoiceStatus::Archived => &[Operation::Cancel],
        }
    }
}
