//! Use-case port implementations for [`MemoryRepository`].

use async_trait::async_trait;

use restvoice_core::usecase::{
    ActivitiesPort, CreateActivityPort, CreateBookingPort, CreateCustomerPort, CreateInvoicePort,
    CreateProjectPort, CreateRatePort, CustomersPort, DeleteBookingPort, GetInvoicePort,
    InvoiceOwnershipPort, ProjectsPort, UpdateInvoicePort,
};
use restvoice_core::{
    Activity, Booking, Customer, Invoice, Project, Rate, RepositoryError,
};

use crate::store::MemoryRepository;

#[async_trait]
impl CreateActivityPort for MemoryRepository {
    async fn create_activity(&self, activity: Activity) -> Result<Activity, RepositoryError> {
        Ok(MemoryRepository::create_activity(self, activity).await)
    }
}

#[async_trait]
impl ActivitiesPort for MemoryRepository {
    async fn activities(&self, user_id: &str) -> Vec<Activity> {
        MemoryRepository::activities(self, user_id).await
    }
}

#[async_trait]
impl CreateBookingPort for MemoryRepository {
    async fn invoice(&self, id: u64) -> Option<Invoice> {
        MemoryRepository::invoice(self, id, false).await
    }

    async fn create_booking(&self, booking: Booking) -> Result<Booking, RepositoryError> {
        MemoryRepository::create_booking(self, booking).await
    }
}

#[async_trait]
impl DeleteBookingPort for MemoryRepository {
    async fn invoice(&self, id: u64) -> Option<Invoice> {
        MemoryRepository::invoice(self, id, false).await
    }

    async fn delete_booking(&self, invoice_id: u64, booking_id: u64) -> Result<(), RepositoryError> {
        MemoryRepository::delete_booking(self, invoice_id, booking_id).await
    }
}

#[async_trait]
impl CreateCustomerPort for MemoryRepository {
    async fn create_customer(&self, customer: Customer) -> Result<Customer, RepositoryError> {
        Ok(MemoryRepository::create_customer(self, customer).await)
    }
}

#[async_trait]
impl CustomersPort for MemoryRepository {
    async fn customers(&self) -> Vec<Customer> {
        MemoryRepository::customers(self).await
    }
}

#[async_trait]
impl CreateProjectPort for MemoryRepository {
    async fn create_project(&self, project: Project) -> Result<Project, RepositoryError> {
        MemoryRepository::create_project(self, project).await
    }
}

#[async_trait]
impl ProjectsPort for MemoryRepository {
    async fn projects(&self, customer_id: u64) -> Vec<Project> {
        MemoryRepository::projects(self, customer_id).await
    }
}

#[async_trait]
impl CreateRatePort for MemoryRepository {
    async fn create_rate(&self, rate: Rate) -> Result<Rate, RepositoryError> {
        MemoryRepository::create_rate(self, rate).await
    }
}

#[async_trait]
impl CreateInvoicePort for MemoryRepository {
    async fn create_invoice(&self, invoice: Invoice) -> Result<Invoice, RepositoryError> {
        MemoryRepository::create_invoice(self, invoice).await
    }
}

#[async_trait]
impl GetInvoicePort for MemoryRepository {
    async fn get_invoice(&self, id: u64, with_bookings: bool) -> Option<Invoice> {
        MemoryRepository::invoice(self, id, with_bookings).await
    }
}

#[async_trait]
impl UpdateInvoicePort for MemoryRepository {
    async fn activity_by_id(&self, user_id: &str, activity_id: u64) -> Option<Activity> {
        MemoryRepository::activity(self, user_id, activity_id).await
    }

    async fn bookings_by_invoice_id(&self, invoice_id: u64) -> Vec<Booking> {
        MemoryRepository::bookings_by_invoice(self, invoice_id).await
    }

    async fn rate_by_project_and_activity(
        &self,
        project_id: u64,
        activity_id: u64,
    ) -> Option<Rate> {
        MemoryRepository::rate(self, project_id, activity_id).await
    }

    async fn update_invoice(&self, invoice: Invoice) -> Result<(), RepositoryError> {
        MemoryRepository::update_invoice(self, invoice).await
    }
}

#[async_trait]
impl InvoiceOwnershipPort for MemoryRepository {
    async fn invoice(&self, id: u64) -> Option<Invoice> {
        MemoryRepository::invoice(self, id, false).await
    }

    async fn customer(&self, id: u64) -> Option<Customer> {
        MemoryRepository::customer(self, id).await
    }
}
