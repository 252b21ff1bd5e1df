//! Error types for the embedding worker

use thiserror::Error;

/// Result type alias for worker operations
pub type Result<T> = std::result::Result<T, WorkerError>;

/// Main error type for the embedding worker
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    #[error("Validation error: {0}")]
    Validation(#[from] crate::middleware::ValidationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkerError {
    /// True when the error must abort the whole cycle
    pub fn is_fatal(&self) -> bool {
        matches!(self, WorkerError::Queue(QueueError::Read(_)))
    }
}

/// Errors raised by the message queue
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Failed to read from queue: {0}")]
    Read(String),

    #[error("Failed to delete message: {0}")]
    Delete(String),

    #[error("Message {0} not found in queue")]
    NotFound(i64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid queue response: {0}")]
    Decode(String),
}

/// Errors in a queued message payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("Malformed message: {0}")]
    Malformed(String),
}

/// Errors related to embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("API request failed with status {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Provider returned an empty embedding")]
    EmptyEmbedding,

    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Errors related to the record store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to update record {record_id}: status {status}: {body}")]
    UpdateFailed {
        record_id: String,
        status: u16,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Refusing to store invalid vector for record {0}")]
    InvalidVector(String),
}

impl From<config::ConfigError> for WorkerError {
    fn from(err: config::ConfigError) -> Self {
        WorkerError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_queue_read_is_fatal() {
        assert!(WorkerError::from(QueueError::Read("down".to_string())).is_fatal());
        assert!(!WorkerError::from(QueueError::NotFound(7)).is_fatal());
        assert!(!WorkerError::from(EmbeddingError::EmptyEmbedding).is_fatal());
        assert!(!WorkerError::from(StoreError::InvalidVector("r1".to_string())).is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = WorkerError::from(EmbeddingError::InvalidDimension { expected: 1536, actual: 3 });
        assert_eq!(
            err.to_string(),
            "Embedding error: Invalid embedding dimension: expected 1536, got 3"
        );
    }
}
