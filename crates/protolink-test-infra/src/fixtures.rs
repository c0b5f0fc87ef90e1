use crate::{Result, TestInfraError};
use jiff::Timestamp;
use protolink_core::{FileSet, PrototypeId, PrototypeRecord, ShortCode, UploadedFile};
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// Builds a file set from `(path, content)` pairs.
pub fn file_set<C: AsRef<[u8]>>(entries: &[(&str, C)]) -> FileSet {
    entries
        .iter()
        .map(|(path, content)| UploadedFile::new(*path, content.as_ref()))
        .collect()
}

/// A record with fresh id and identical creation and update times.
pub fn record(name: &str, code: &str, created_at: Timestamp) -> PrototypeRecord {
    PrototypeRecord {
        id: PrototypeId::new(),
        name: name.to_string(),
        short_code: ShortCode::new_unchecked(code),
        created_at,
        updated_at: created_at,
    }
}

/// Reads every regular file below `root`, keyed by its `/`-separated path
/// relative to `root`. Symbolic links are followed.
///
/// A missing `root` reads as an empty tree.
pub fn read_tree(root: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut tree = BTreeMap::new();
    if !root.exists() {
        return Ok(tree);
    }

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .components()
            .map(|c| {
                c.as_os_str()
                    .to_str()
                    .map(str::to_owned)
                    .ok_or_else(|| TestInfraError::NonUtf8Path(entry.path().display().to_string()))
            })
            .collect::<Result<Vec<_>>>()?
            .join("/");

        tree.insert(relative, std::fs::read(entry.path())?);
    }

    Ok(tree)
}
