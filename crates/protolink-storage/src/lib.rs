//! Storage backends for Protolink.
//!
//! - [`JsonFileIndex`]: durable metadata index kept in one JSON file.
//! - [`InMemoryIndex`]: non-durable metadata index for tests and throwaway runs.
//! - [`FsBlobStore`]: prototype file trees on the local filesystem.

mod error;
pub mod fs;
pub mod json;
pub mod memory;

pub use fs::FsBlobStore;
pub use json::JsonFileIndex;
pub use memory::InMemoryIndex;
pub use protolink_core::{BlobStore, MetadataIndex, ReadIndex, StorageError, StorageResult};
