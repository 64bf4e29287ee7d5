use thiserror::Error;

use taskhub_core::storage::RepositoryError;
use taskhub_core::task::TaskError;

/// Errors returned by the task and notification services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Validation failed: {0}")]
    Validation(String),
    /// Storage, cache or queue failure. Retrying later may succeed.
    #[error("Service unavailable: {0}")]
    Transient(String),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity_type, id } => ServiceError::NotFound {
                entity: entity_type,
                id,
            },
            RepositoryError::InvalidData(_) | RepositoryError::AlreadyExists { .. } => {
                ServiceError::Validation(err.to_string())
            }
            RepositoryError::ConnectionFailed(_)
            | RepositoryError::QueryFailed(_)
            | RepositoryError::Serialization(_) => ServiceError::Transient(err.to_string()),
        }
    }
}

impl From<TaskError> for ServiceError {
    fn from(err: TaskError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

/// Maps a service error to an HTTP status code.
pub fn service_error_to_status_code(error: &ServiceError) -> u16 {
    match error {
        ServiceError::NotFound { .. } => 404,
        ServiceError::Validation(_) => 400,
        ServiceError::Transient(_) => 503,
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
