use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{RepositoryError, UseCaseError};
use crate::project::Project;

#[async_trait]
pub trait CreateProjectPort: Send + Sync {
    async fn create_project(&self, project: Project) -> Result<Project, RepositoryError>;
}

#[async_trait]
pub trait ProjectsPort: Send + Sync {
    async fn projects(&self, customer_id: u64) -> Vec<Project>;
}

/// Creates a project for a customer.
#[derive(Clone)]
pub struct CreateProject {
    port: Arc<dyn CreateProjectPort>,
}

impl CreateProject {
    pub fn new(port: Arc<dyn CreateProjectPort>) -> Self {
        Self { port }
    }

    pub async fn run(&self, customer_id: u64, mut project: Project) -> Result<Project, UseCaseError> {
        if project.name.trim().is_empty() {
            return Err(UseCaseError::Validation("project name must not be empty".into()));
        }
        project.customer_id = customer_id;
        Ok(self.port.create_project(project).await?)
    }
}

/// Lists the projects of a customer.
#[derive(Clone)]
pub struct Projects {
    port: Arc<dyn ProjectsPort>,
}

impl Projects {
    pub fn new(port: Arc<dyn ProjectsPort>) -> Self {
        Self { port }
    }

    pub async fn run(&self, customer_id: u64) -> Vec<Project> {
        self.port.projects(customer_id).await
    }
}
