use thiserror::Error;

/// Errors raised while validating core values (short codes, upload paths).
pub type Result<T> = std::result::Result<T, CoreError>;

/// Result type for index and blob store operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("invalid relative path: {0}")]
    InvalidPath(String),
    #[error("invalid prototype id: {0}")]
    InvalidId(String),
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("conflicting record: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage io failed: {0}")]
    Io(String),
    #[error("storage serialization failed: {0}")]
    Serialization(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("invalid input: {0}")]
    Invalid(#[from] CoreError),
}
