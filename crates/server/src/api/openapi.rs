#![allow(clippy::needless_for_each)]

use restvoice_core::{Activity, Booking, Customer, Invoice, InvoiceStatus, Position, Project, Rate};

use super::hal::{Embedded, HalInvoice, Link};
use super::schemas::{ErrorResponse, HealthResponse};
use crate::auth::AuthInfo;

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Restvoice API",
        version = "0.1.0",
        description = "Invoicing API: book hours on monthly invoices and aggregate them into priced positions.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Auth", description = "OAuth access code exchange"),
        (name = "Activities", description = "Kinds of work a user books time against"),
        (name = "Customers", description = "Customers invoices are issued to"),
        (name = "Projects", description = "Projects and their hourly rates"),
        (name = "Invoices", description = "Monthly invoices and their lifecycle"),
        (name = "Bookings", description = "Hours booked on an invoice"),
    ),
    paths(
        super::health::health,
        super::token::exchange_token,
        super::activities::list_activities,
        super::activities::create_activity,
        super::customers::list_customers,
        super::customers::create_customer,
        super::projects::list_projects,
        super::projects::create_project,
        super::projects::create_rate,
        super::invoices::create_invoice,
        super::invoices::get_invoice,
        super::invoices::update_invoice,
        super::bookings::create_booking,
        super::bookings::delete_booking,
    ),
    components(schemas(
        Activity,
        AuthInfo,
        Booking,
        Customer,
        Embedded,
        ErrorResponse,
        HalInvoice,
        HealthResponse,
        Invoice,
        InvoiceStatus,
        Link,
        Position,
        Project,
        Rate,
    ))
)]
pub struct ApiDoc;
