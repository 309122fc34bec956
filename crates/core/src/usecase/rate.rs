use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{RepositoryError, UseCaseError};
use crate::rate::Rate;

#[async_trait]
pub trait CreateRatePort: Send + Sync {
    /// Store a rate, replacing any previous rate for the same
    /// (project, activity) pair.
    async fn create_rate(&self, rate: Rate) -> Result<Rate, RepositoryError>;
}

/// Sets the hourly price of an activity on a project.
#[derive(Clone)]
pub struct CreateRate {
    port: Arc<dyn CreateRatePort>,
}

impl CreateRate {
    pub fn new(port: Arc<dyn CreateRatePort>) -> Self {
        Self { port }
    }

    pub async fn run(&self, project_id: u64, mut rate: Rate) -> Result<Rate, UseCaseError> {
        if !rate.price.is_finite() || rate.price < 0.0 {
            return Err(UseCaseError::Validation(format!(
                "price must be a non-negative number, got {}",
                rate.price
            )));
        }
        rate.project_id = project_id;
        Ok(self.port.create_rate(rate).await?)
    }
}
