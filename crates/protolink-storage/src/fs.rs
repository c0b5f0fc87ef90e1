use crate::error::map_io_error;
use async_trait::async_trait;
use protolink_core::{BlobStore, FileSet, PrototypeId, StorageResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Directory under the base directory holding in-progress replacements.
pub const STAGING_DIR_NAME: &str = ".staging";

/// Blob store keeping every prototype in `<base_dir>/<id>/`.
///
/// Replacements are assembled in `<base_dir>/.staging/` and renamed into
/// place, so the staging area must live on the same filesystem as the
/// prototype directories.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    base_dir: PathBuf,
}

impl FsBlobStore {
    /// Opens (and creates if needed) the store rooted at `base_dir`.
    ///
    /// Leftovers of replacements interrupted by a crash are discarded.
    pub async fn open(base_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let store = Self {
            base_dir: base_dir.into(),
        };

        tokio::fs::create_dir_all(&store.base_dir)
            .await
            .map_err(|e| map_io_error(&store.base_dir, e))?;

        let staging = store.staging_dir();
        match tokio::fs::remove_dir_all(&staging).await {
            Ok(()) => debug!(path = %staging.display(), "discarded stale staging area"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(map_io_error(&staging, e)),
        }

        Ok(store)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn staging_dir(&self) -> PathBuf {
        self.base_dir.join(STAGING_DIR_NAME)
    }

    /// Writes every file of `files` below `root`.
    async fn write_tree(root: &Path, files: &FileSet) -> StorageResult<()> {
        // every path is checked before the first byte hits the disk
        let resolved = files.resolve_paths()?;

        tokio::fs::create_dir_all(root)
            .await
            .map_err(|e| map_io_error(root, e))?;

        for (relative, content) in resolved {
            let target = root.join(relative.to_path_buf());

            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| map_io_error(parent, e))?;
            }

            tokio::fs::write(&target, content)
                .await
                .map_err(|e| map_io_error(&target, e))?;

            trace!(path = %relative, bytes = content.len(), "file written");
        }

        Ok(())
    }
}

async fn remove_dir_if_exists(path: &Path) -> StorageResult<bool> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(map_io_error(path, e)),
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn write(&self, id: &PrototypeId, files: &FileSet) -> StorageResult<()> {
        let root = self.path_for(id);
        Self::write_tree(&root, files).await?;

        debug!(id = %id, files = files.len(), bytes = files.total_bytes(), "prototype files written");
        Ok(())
    }

    async fn replace(&self, id: &PrototypeId, files: &FileSet) -> StorageResult<()> {
        let nonce = Uuid::new_v4().simple();
        let staged = self.staging_dir().join(format!("{id}.{nonce}"));
        let retired = self.staging_dir().join(format!("{id}.{nonce}.old"));
        let target = self.path_for(id);

        if let Err(e) = Self::write_tree(&staged, files).await {
            let _ = remove_dir_if_exists(&staged).await;
            return Err(e);
        }

        let had_previous = match tokio::fs::rename(&target, &retired).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                let _ = remove_dir_if_exists(&staged).await;
                return Err(map_io_error(&target, e));
            }
        };

        if let Err(e) = tokio::fs::rename(&staged, &target).await {
            if had_previous {
                if let Err(restore) = tokio::fs::rename(&retired, &target).await {
                    warn!(id = %id, error = %restore, "failed to restore previous files");
                }
            }
            let _ = remove_dir_if_exists(&staged).await;
            return Err(map_io_error(&target, e));
        }

        if had_previous {
            // The new tree is live; a leftover here is only disk usage and is
            // discarded on the next open.
            if let Err(e) = remove_dir_if_exists(&retired).await {
                warn!(id = %id, error = %e, "failed to remove replaced files");
            }
        }

        debug!(id = %id, files = files.len(), replaced = had_previous, "prototype files replaced");
        Ok(())
    }

    async fn remove(&self, id: &PrototypeId) -> StorageResult<()> {
        let removed = remove_dir_if_exists(&self.path_for(id)).await?;
        debug!(id = %id, removed, "prototype files removed");
        Ok(())
    }

    async fn exists(&self, id: &PrototypeId) -> StorageResult<bool> {
        let path = self.path_for(id);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(map_io_error(&path, e)),
        }
    }

    async fn list_ids(&self) -> StorageResult<Vec<PrototypeId>> {
        let mut entries = tokio::fs::read_dir(&self.base_dir)
            .await
            .map_err(|e| map_io_error(&self.base_dir, e))?;

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| map_io_error(&self.base_dir, e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map_err(|e| map_io_error(&entry.path(), e))?
                .is_dir();
            if !is_dir {
                continue;
            }

            match entry.file_name().to_str().map(str::parse::<PrototypeId>) {
                Some(Ok(id)) => ids.push(id),
                _ => trace!(path = %entry.path().display(), "skipping foreign directory"),
            }
        }

        ids.sort();
        Ok(ids)
    }

    fn path_for(&self, id: &PrototypeId) -> PathBuf {
        self.base_dir.join(id.to_string())
    }
}
