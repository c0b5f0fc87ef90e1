use protolink_core::{CoreError, StorageError};
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

/// The step of an operation during which storage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    IndexLookup,
    BlobWrite,
    IndexUpsert,
    IndexDelete,
    BlobRemove,
    ConsistencyScan,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            Stage::IndexLookup => "index lookup",
            Stage::BlobWrite => "blob write",
            Stage::IndexUpsert => "index upsert",
            Stage::IndexDelete => "index delete",
            Stage::BlobRemove => "blob remove",
            Stage::ConsistencyScan => "consistency scan",
        };
        f.write_str(stage)
    }
}

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{stage} failed: {source}")]
    Persistence {
        stage: Stage,
        #[source]
        source: StorageError,
    },
    #[error("conflict: {0}")]
    Conflict(String),
}

impl ServiceError {
    /// Classifies a storage error raised during `stage`.
    pub(crate) fn storage(stage: Stage) -> impl FnOnce(StorageError) -> Self {
        move |error| match error {
            StorageError::Conflict(message) => Self::Conflict(message),
            StorageError::Invalid(core) => core.into(),
            source => Self::Persistence { stage, source },
        }
    }

    /// The failing stage, for persistence errors.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Persistence { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(value: CoreError) -> Self {
        Self::Validation(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_and_invalid_input_are_not_persistence_errors() {
        let conflict = ServiceError::storage(Stage::IndexUpsert)(StorageError::Conflict(
            "short code 'abc' is taken".into(),
        ));
        assert!(matches!(conflict, ServiceError::Conflict(_)));

        let invalid = ServiceError::storage(Stage::BlobWrite)(StorageError::Invalid(
            CoreError::InvalidPath("..".into()),
        ));
        assert!(matches!(invalid, ServiceError::Validation(_)));
    }

    #[test]
    fn persistence_errors_name_their_stage() {
        let err = ServiceError::storage(Stage::BlobWrite)(StorageError::Io("disk full".into()));

        assert_eq!(err.stage(), Some(Stage::BlobWrite));
        assert_eq!(
            err.to_string(),
            "blob write failed: storage io failed: disk full"
        );
    }
}
