use std::sync::Arc;

use async_trait::async_trait;

use crate::activity::Activity;
use crate::error::{RepositoryError, UseCaseError};

#[async_trait]
pub trait CreateActivityPort: Send + Sync {
    async fn create_activity(&self, activity: Activity) -> Result<Activity, RepositoryError>;
}

#[async_trait]
pub trait ActivitiesPort: Send + Sync {
    async fn activities(&self, user_id: &str) -> Vec<Activity>;
}

/// Registers a new activity for the acting user.
#[derive(Clone)]
pub struct CreateActivity {
    port: Arc<dyn CreateActivityPort>,
}

impl CreateActivity {
    pub fn new(port: Arc<dyn CreateActivityPort>) -> Self {
        Self { port }
    }

    pub async fn run(&self, user_id: &str, mut activity: Activity) -> Result<Activity, UseCaseError> {
        if activity.name.trim().is_empty() {
            return Err(UseCaseError::Validation("activity name must not be empty".into()));
        }
        user_id.clone_into(&mut activity.user_id);
        Ok(self.port.create_activity(activity).await?)
    }
}

/// Lists the activities registered by a user.
#[derive(Clone)]
pub struct Activities {
    port: Arc<dyn ActivitiesPort>,
}

impl Activities {
    pub fn new(port: Arc<dyn ActivitiesPort>) -> Self {
        Self { port }
    }

    pub async fn run(&self, user_id: &str) -> Vec<Activity> {
        self.port.activities(user_id).await
    }
}
