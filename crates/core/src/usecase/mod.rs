//! Application use cases.
//!
//! Every use case depends on a small port trait that names exactly the
//! repository capabilities it needs. A repository backend implements the
//! ports; the HTTP layer holds each use case behind an `Arc<dyn Port>`.

mod activity;
mod booking;
mod customer;
mod invoice;
mod ownership;
mod project;
mod rate;

pub use activity::{Activities, ActivitiesPort, CreateActivity, CreateActivityPort};
pub use booking::{CreateBooking, CreateBookingPort, DeleteBooking, DeleteBookingPort};
pub use customer::{CreateCustomer, CreateCustomerPort, Customers, CustomersPort};
pub use invoice::{
    CreateInvoice, CreateInvoicePort, GetInvoice, GetInvoicePort, UpdateInvoice,
    UpdateInvoicePort,
};
pub use ownership::{InvoiceOwnership, InvoiceOwnershipPort, Ownership};
pub use project::{CreateProject, CreateProjectPort, Projects, ProjectsPort};
pub use rate::{CreateRate, CreateRatePort};
