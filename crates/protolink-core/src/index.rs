use crate::error::StorageResult;
use crate::id::PrototypeId;
use crate::page::{Page, PageRequest};
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A prototype as stored in the metadata index.
///
/// The storage location is not part of the record; it is derived from
/// `id` by the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrototypeRecord {
    pub id: PrototypeId,
    /// The logical name; at most one live record carries a given name.
    pub name: String,
    pub short_code: ShortCode,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PrototypeRecord {
    /// URL of the viewer page for this prototype.
    pub fn preview_url(&self, base_url: &str) -> String {
        self.short_code
            .to_url(&format!("{}/preview", base_url.trim_end_matches('/')))
    }

    /// Listing order: newest first, then by name and id so that records
    /// created in the same instant still list deterministically.
    pub fn recency_order(a: &Self, b: &Self) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// A read-only view of the metadata index.
#[async_trait]
pub trait ReadIndex: Send + Sync + 'static {
    /// Returns `None` if no record has this id.
    async fn get_by_id(&self, id: &PrototypeId) -> StorageResult<Option<PrototypeRecord>>;

    /// Returns the unique record holding `code`, if any.
    async fn get_by_short_code(&self, code: &ShortCode) -> StorageResult<Option<PrototypeRecord>>;

    /// Returns the live record for a logical name, if any.
    async fn get_by_name(&self, name: &str) -> StorageResult<Option<PrototypeRecord>>;

    /// Lists records newest first (see [`PrototypeRecord::recency_order`]).
    async fn list(&self, request: PageRequest) -> StorageResult<Page<PrototypeRecord>>;

    /// Returns every record in unspecified order.
    async fn all(&self) -> StorageResult<Vec<PrototypeRecord>>;
}

#[async_trait]
pub trait MetadataIndex: ReadIndex {
    /// Inserts or replaces the record with the same id and makes the change
    /// durable before returning.
    ///
    /// Returns `Err(Conflict)` if another record already holds the same
    /// short code or name. After any error the record is not visible.
    async fn upsert(&self, record: PrototypeRecord) -> StorageResult<()>;

    /// Deletes the record with the given id.
    /// Returns `true` if the record existed and was removed.
    async fn delete(&self, id: &PrototypeId) -> StorageResult<bool>;
}
