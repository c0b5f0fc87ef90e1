use protolink_core::{PrototypeId, PrototypeRecord, ShortCode};
use serde::Serialize;

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub id: PrototypeId,
    pub short_code: ShortCode,
    /// `true` if an existing prototype with the same name was replaced.
    pub overwritten: bool,
    /// The record as stored in the index.
    pub record: PrototypeRecord,
}

/// Disagreements between the metadata index and the blob store.
///
/// Produced by [`PrototypeService::check_consistency`][crate::PrototypeService::check_consistency];
/// nothing is repaired.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    /// Records whose directory is missing.
    pub orphan_records: Vec<PrototypeRecord>,
    /// Directories that no record points at.
    pub orphan_directories: Vec<PrototypeId>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.orphan_records.is_empty() && self.orphan_directories.is_empty()
    }
}
