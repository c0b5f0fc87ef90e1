use std::result::Result as StdResult;
use thiserror::Error;

/// Errors that can occur while preparing test fixtures.
#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("path {0} is not valid UTF-8")]
    NonUtf8Path(String),
}

/// A type alias for `Result` with `TestInfraError`.
pub type Result<T> = StdResult<T, TestInfraError>;
