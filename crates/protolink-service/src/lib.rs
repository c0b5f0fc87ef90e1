//! Prototype service for Protolink.
//!
//! [`PrototypeService`] ties a [`MetadataIndex`], a [`BlobStore`] and a
//! short code [`Generator`] together: it saves uploaded file sets under a
//! logical name, overwriting earlier uploads of the same name, and resolves
//! short codes back to prototypes.
//!
//! [`MetadataIndex`]: protolink_core::MetadataIndex
//! [`BlobStore`]: protolink_core::BlobStore
//! [`Generator`]: protolink_generator::Generator

pub mod error;
pub mod outcome;
pub mod service;

pub use error::{Result, ServiceError, Stage};
pub use outcome::{ConsistencyReport, SaveOutcome};
pub use service::{PrototypeService, MAX_MINT_ATTEMPTS, UNTITLED_PROTOTYPE};
