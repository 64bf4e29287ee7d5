use thiserror::Error;

/// Errors that can occur during job queue operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Queue operation failed: {0}")]
    OperationFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
