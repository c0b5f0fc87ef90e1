use protolink_core::{PrototypeRecord, StorageError, StorageResult};
use std::io::ErrorKind;
use std::path::Path;

/// Maps an io error on `path` into the storage taxonomy.
pub(crate) fn map_io_error(path: &Path, err: std::io::Error) -> StorageError {
    let message = format!("{}: {err}", path.display());

    match err.kind() {
        ErrorKind::PermissionDenied => StorageError::Unavailable(message),
        ErrorKind::InvalidData | ErrorKind::UnexpectedEof => StorageError::InvalidData(message),
        _ => StorageError::Io(message),
    }
}

/// Rejects `candidate` if a record with a different id already holds its
/// short code or its name.
pub(crate) fn ensure_no_conflict<'a>(
    existing: impl IntoIterator<Item = &'a PrototypeRecord>,
    candidate: &PrototypeRecord,
) -> StorageResult<()> {
    for record in existing {
        if record.id == candidate.id {
            continue;
        }
        if record.short_code == candidate.short_code {
            return Err(StorageError::Conflict(format!(
                "short code '{}' is already used by prototype {}",
                candidate.short_code, record.id
            )));
        }
        if record.name == candidate.name {
            return Err(StorageError::Conflict(format!(
                "name '{}' is already used by prototype {}",
                candidate.name, record.id
            )));
        }
    }

    Ok(())
}
