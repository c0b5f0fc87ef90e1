use crate::error::ensure_no_conflict;
use async_trait::async_trait;
use dashmap::DashMap;
use protolink_core::{
    MetadataIndex, Page, PageRequest, PrototypeId, PrototypeRecord, ReadIndex, ShortCode,
    StorageResult,
};

/// In-memory implementation of the metadata index using DashMap.
///
/// Nothing is persisted: the contents are lost when the value is dropped.
/// Lookups by name and short code scan all entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIndex {
    storage: DashMap<PrototypeId, PrototypeRecord>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
        }
    }

    fn find(&self, predicate: impl Fn(&PrototypeRecord) -> bool) -> Option<PrototypeRecord> {
        self.storage
            .iter()
            .find(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
    }

    fn snapshot(&self) -> Vec<PrototypeRecord> {
        self.storage
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[async_trait]
impl ReadIndex for InMemoryIndex {
    async fn get_by_id(&self, id: &PrototypeId) -> StorageResult<Option<PrototypeRecord>> {
        Ok(self.storage.get(id).map(|entry| entry.value().clone()))
    }

    async fn get_by_short_code(&self, code: &ShortCode) -> StorageResult<Option<PrototypeRecord>> {
        Ok(self.find(|record| &record.short_code == code))
    }

    async fn get_by_name(&self, name: &str) -> StorageResult<Option<PrototypeRecord>> {
        Ok(self.find(|record| record.name == name))
    }

    async fn list(&self, request: PageRequest) -> StorageResult<Page<PrototypeRecord>> {
        let mut records = self.snapshot();
        records.sort_by(PrototypeRecord::recency_order);
        Ok(request.slice(records))
    }

    async fn all(&self) -> StorageResult<Vec<PrototypeRecord>> {
        Ok(self.snapshot())
    }
}

#[async_trait]
impl MetadataIndex for InMemoryIndex {
    async fn upsert(&self, record: PrototypeRecord) -> StorageResult<()> {
        // Check-then-insert is not atomic across shards; callers serialize
        // writers of the same name.
        let existing = self.snapshot();
        ensure_no_conflict(&existing, &record)?;

        self.storage.insert(record.id, record);
        Ok(())
    }

    async fn delete(&self, id: &PrototypeId) -> StorageResult<bool> {
        Ok(self.storage.remove(id).is_some())
    }
}
