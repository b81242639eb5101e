// src/errors.rs
use thiserror::Error;

/// Rejections raised before any network activity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File too large: {size} bytes. Maximum size: {}MB", .max / 1024 / 1024)]
    FileTooLarge { size: usize, max: usize },

    #[error("Unsupported image format: {0}")]
    UnsupportedType(String),

    #[error("No file provided")]
    EmptyFile,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    ResponseFormat(String),

    #[error("Image decode error: {0}")]
    Decode(String),

    #[error("All upload services failed. Last error: {last}")]
    AggregateUploadFailure { last: Box<UploadError> },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Record id already exists: {0}")]
    DuplicateId(String),
}

impl UploadError {
    /// Errors the orchestrator absorbs by moving on to the next backend.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            UploadError::Config(_) | UploadError::Network(_) | UploadError::ResponseFormat(_)
        )
    }
}

impl From<redis::RedisError> for UploadError {
    fn from(e: redis::RedisError) -> Self {
        UploadError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for UploadError {
    fn from(e: serde_json::Error) -> Self {
        UploadError::Serialization(e.to_string())
    }
}
