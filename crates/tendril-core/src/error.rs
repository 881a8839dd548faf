//! Error types for Tendril Core

use thiserror::Error;

use crate::limits::ValidationError;

/// Result type alias using Tendril's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Tendril error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Relation store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
