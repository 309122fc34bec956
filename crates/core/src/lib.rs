pub mod activity;
pub mod booking;
pub mod customer;
pub mod error;
pub mod invoice;
pub mod project;
pub mod rate;
pub mod usecase;

pub use activity::Activity;
pub use booking::Booking;
pub use customer::Customer;
pub use error::{RepositoryError, UseCaseError};
pub use invoice::{Invoice, InvoiceStatus, Operation, Position, Positions};
pub use project::Project;
pub use rate::Rate;
