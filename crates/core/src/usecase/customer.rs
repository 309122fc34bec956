use std::sync::Arc;

use async_trait::async_trait;

use crate::customer::Customer;
use crate::error::{RepositoryError, UseCaseError};

#[async_trait]
pub trait CreateCustomerPort: Send + Sync {
    async fn create_customer(&self, customer: Customer) -> Result<Customer, RepositoryError>;
}

#[async_trait]
pub trait CustomersPort: Send + Sync {
    async fn customers(&self) -> Vec<Customer>;
}

/// Creates a customer owned by the acting user.
#[derive(Clone)]
pub struct CreateCustomer {
    port: Arc<dyn CreateCustomerPort>,
}

impl CreateCustomer {
    pub fn new(port: Arc<dyn CreateCustomerPort>) -> Self {
        Self { port }
    }

    pub async fn run(&self, user_id: &str, mut customer: Customer) -> Result<Customer, UseCaseError> {
        if customer.name.trim().is_empty() {
            return Err(UseCaseError::Validation("customer name must not be empty".into()));
        }
        user_id.clone_into(&mut customer.user_id);
        Ok(self.port.create_customer(customer).await?)
    }
}

/// Lists every customer.
#[derive(Clone)]
pub struct Customers {
    port: Arc<dyn CustomersPort>,
}

impl Customers {
    pub fn new(port: Arc<dyn CustomersPort>) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> Vec<Customer> {
        self.port.customers().await
    }
}
