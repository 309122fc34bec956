use thiserror::Error;

/// Errors reported by a repository backend.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Shorthand for a missing entity.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Errors returned by use cases.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UseCaseError {
    /// The caller supplied data that violates a domain rule.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The operation is not allowed in the entity's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
