//! Core types and traits for Protolink.
//!
//! This crate provides the types shared by the storage backends and the
//! prototype service: identities, short codes, uploaded file sets,
//! pagination, and the [`MetadataIndex`] and [`BlobStore`] contracts.

pub mod blob;
pub mod clock;
pub mod error;
pub mod files;
pub mod id;
pub mod index;
pub mod page;
pub mod path;
pub mod shortcode;

pub use blob::BlobStore;
pub use clock::{Clock, SystemClock};
pub use error::{CoreError, StorageError, StorageResult};
pub use files::{FileSet, UploadedFile};
pub use id::PrototypeId;
pub use index::{MetadataIndex, PrototypeRecord, ReadIndex};
pub use page::{Page, PageRequest};
pub use path::RelativePath;
pub use shortcode::ShortCode;
