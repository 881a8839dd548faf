//! Storage error types

use crate::batch::BatchWriteRequest;
use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Storage-specific error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    /// Malformed batch or argument, rejected before anything is sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Throttling or temporary unavailability; worth retrying
    #[error("Transient store error: {0}")]
    Transient(String),

    /// Rejected outright (authorization, malformed request)
    #[error("Store rejected request: {0}")]
    NonRetryable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Failure of a whole apply run.
///
/// Carries the operations that were never confirmed so the caller can
/// defer them to a later pass or fail the outer request.
#[derive(Error, Debug)]
#[error("{source} ({} operations not applied)", .remaining.len())]
pub struct ApplyError {
    #[source]
    pub source: StorageError,
    pub remaining: BatchWriteRequest,
}

impl ApplyError {
    pub fn new(source: StorageError, remaining: BatchWriteRequest) -> Self {
        Self { source, remaining }
    }
}
