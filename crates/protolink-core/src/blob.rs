use crate::error::StorageResult;
use crate::files::FileSet;
use crate::id::PrototypeId;
use async_trait::async_trait;
use std::path::PathBuf;

/// Storage for the file trees of prototypes, one directory per id.
///
/// Relative paths inside a [`FileSet`] are decoded and normalized with
/// [`RelativePath::parse`][crate::path::RelativePath::parse] before being
/// joined onto the prototype directory.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Creates the directory for `id` and writes every file into it,
    /// creating intermediate directories as needed.
    ///
    /// If a write fails the error is returned and files written so far are
    /// left in place.
    async fn write(&self, id: &PrototypeId, files: &FileSet) -> StorageResult<()>;

    /// Replaces the directory for `id` with a tree holding exactly `files`.
    ///
    /// The new tree is completed before the old one is removed; on error the
    /// previous tree (if any) is still in place.
    async fn replace(&self, id: &PrototypeId, files: &FileSet) -> StorageResult<()>;

    /// Recursively removes the directory for `id`.
    ///
    /// Removing a directory that does not exist is not an error.
    async fn remove(&self, id: &PrototypeId) -> StorageResult<()>;

    /// Checks whether a directory exists for `id`.
    async fn exists(&self, id: &PrototypeId) -> StorageResult<bool>;

    /// Lists the ids of all stored prototype directories.
    async fn list_ids(&self) -> StorageResult<Vec<PrototypeId>>;

    /// The directory holding the files of `id`. Performs no I/O.
    fn path_for(&self, id: &PrototypeId) -> PathBuf;
}
