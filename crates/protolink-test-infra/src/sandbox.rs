use crate::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A disposable directory holding a data directory (for the index) and an
/// upload directory (for the blob store). Everything is deleted on drop.
#[derive(Debug)]
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn start() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("protolink-").tempdir()?;
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Directory for the metadata index. Not created until something
    /// opens an index in it.
    pub fn data_dir(&self) -> PathBuf {
        self.root().join("data")
    }

    /// Base directory for the blob store. Not created until a store is
    /// opened on it.
    pub fn upload_dir(&self) -> PathBuf {
        self.root().join("uploads")
    }
}
