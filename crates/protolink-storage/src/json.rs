use crate::error::{ensure_no_conflict, map_io_error};
use async_trait::async_trait;
use protolink_core::{
    MetadataIndex, Page, PageRequest, PrototypeId, PrototypeRecord, ReadIndex, ShortCode,
    StorageError, StorageResult,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, trace};

/// File name used for the index inside a data directory.
pub const INDEX_FILE_NAME: &str = "prototypes.json";

/// Metadata index persisted as a single JSON file.
///
/// Every mutation rewrites the whole file: the records are serialized to a
/// temporary sibling file which is then renamed over the index file. The
/// write lock is held until the rename completes, so mutations inside one
/// process never lose each other's updates.
///
/// Two processes opening the same file do not coordinate. Each holds its own
/// copy of the records and the last one to write wins; run a single process
/// per index file.
#[derive(Debug)]
pub struct JsonFileIndex {
    path: PathBuf,
    records: RwLock<HashMap<PrototypeId, PrototypeRecord>>,
}

impl JsonFileIndex {
    /// Opens the index stored at `path`, creating an empty one if the file
    /// does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| map_io_error(parent, e))?;
        }

        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => decode_records(&path, &bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "index file missing, creating an empty index");
                let records = HashMap::new();
                write_records(&path, &records).await?;
                records
            }
            Err(e) => return Err(map_io_error(&path, e)),
        };

        info!(path = %path.display(), records = records.len(), "loaded prototype index");

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// Opens `<data_dir>/prototypes.json`.
    pub async fn open_in(data_dir: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open(data_dir.as_ref().join(INDEX_FILE_NAME)).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn find(
        &self,
        predicate: impl Fn(&PrototypeRecord) -> bool,
    ) -> Option<PrototypeRecord> {
        self.records
            .read()
            .await
            .values()
            .find(|record| predicate(record))
            .cloned()
    }
}

fn decode_records(path: &Path, bytes: &[u8]) -> StorageResult<HashMap<PrototypeId, PrototypeRecord>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(HashMap::new());
    }

    let list: Vec<PrototypeRecord> = serde_json::from_slice(bytes).map_err(|e| {
        StorageError::InvalidData(format!("{}: malformed index: {e}", path.display()))
    })?;

    let mut records = HashMap::with_capacity(list.len());
    for record in list {
        ensure_no_conflict(records.values(), &record).map_err(|e| {
            StorageError::InvalidData(format!("{}: {e}", path.display()))
        })?;
        if let Some(duplicate) = records.insert(record.id, record) {
            return Err(StorageError::InvalidData(format!(
                "{}: duplicate prototype id {}",
                path.display(),
                duplicate.id
            )));
        }
    }

    Ok(records)
}

/// Serializes all records and atomically replaces the file at `path`.
async fn write_records(
    path: &Path,
    records: &HashMap<PrototypeId, PrototypeRecord>,
) -> StorageResult<()> {
    let mut ordered: Vec<&PrototypeRecord> = records.values().collect();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    let bytes = serde_json::to_vec_pretty(&ordered)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

    let tmp = temp_path_for(path);
    let written = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        tokio::fs::rename(&tmp, path).await
    }
    .await;

    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(map_io_error(path, e));
    }

    trace!(path = %path.display(), records = ordered.len(), "index written");
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| INDEX_FILE_NAME.into());
    name.push(format!(".tmp-{}", std::process::id()));
    path.with_file_name(name)
}

#[async_trait]
impl ReadIndex for JsonFileIndex {
    async fn get_by_id(&self, id: &PrototypeId) -> StorageResult<Option<PrototypeRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn get_by_short_code(&self, code: &ShortCode) -> StorageResult<Option<PrototypeRecord>> {
        Ok(self.find(|record| &record.short_code == code).await)
    }

    async fn get_by_name(&self, name: &str) -> StorageResult<Option<PrototypeRecord>> {
        Ok(self.find(|record| record.name == name).await)
    }

    async fn list(&self, request: PageRequest) -> StorageResult<Page<PrototypeRecord>> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by(PrototypeRecord::recency_order);
        Ok(request.slice(records))
    }

    async fn all(&self) -> StorageResult<Vec<PrototypeRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}

#[async_trait]
impl MetadataIndex for JsonFileIndex {
    async fn upsert(&self, record: PrototypeRecord) -> StorageResult<()> {
        let mut records = self.records.write().await;
        ensure_no_conflict(records.values(), &record)?;

        let id = record.id;
        let previous = records.insert(id, record);

        if let Err(e) = write_records(&self.path, &records).await {
            // roll back so the failed record never becomes visible
            match previous {
                Some(previous) => records.insert(id, previous),
                None => records.remove(&id),
            };
            return Err(e);
        }

        debug!(id = %id, replaced = previous.is_some(), "index record upserted");
        Ok(())
    }

    async fn delete(&self, id: &PrototypeId) -> StorageResult<bool> {
        let mut records = self.records.write().await;
        let Some(removed) = records.remove(id) else {
            return Ok(false);
        };

        if let Err(e) = write_records(&self.path, &records).await {
            records.insert(*id, removed);
            return Err(e);
        }

        debug!(id = %id, "index record deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;

    fn record(name: &str, code: &str) -> PrototypeRecord {
        let now = Timestamp::now();
        PrototypeRecord {
            id: PrototypeId::new(),
            name: name.to_string(),
            short_code: ShortCode::new_unchecked(code),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn open_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(INDEX_FILE_NAME);

        let index = JsonFileIndex::open(&path).await.unwrap();

        assert!(index.all().await.unwrap().is_empty());
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), "[]");
    }

    #[tokio::test]
    async fn empty_file_is_an_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(INDEX_FILE_NAME);
        std::fs::write(&path, "\n").unwrap();

        let index = JsonFileIndex::open(&path).await.unwrap();
        assert!(index.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(INDEX_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonFileIndex::open(&path).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidData(_)));
    }

    #[tokio::test]
    async fn duplicate_codes_in_file_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(INDEX_FILE_NAME);
        let records = vec![record("one", "samecode"), record("two", "samecode")];
        std::fs::write(&path, serde_json::to_vec(&records).unwrap()).unwrap();

        let err = JsonFileIndex::open(&path).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidData(_)));
    }

    #[tokio::test]
    async fn upsert_writes_through() {
        let dir = tempfile::tempdir().unwrap();
        let index = JsonFileIndex::open_in(dir.path()).await.unwrap();
        let rec = record("demo", "abc12345");

        index.upsert(rec.clone()).await.unwrap();

        let on_disk: Vec<PrototypeRecord> =
            serde_json::from_slice(&std::fs::read(index.path()).unwrap()).unwrap();
        assert_eq!(on_disk, vec![rec]);
    }

    #[tokio::test]
    async fn failed_write_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let index = JsonFileIndex::open_in(&data_dir).await.unwrap();
        let kept = record("kept", "code0001");
        index.upsert(kept.clone()).await.unwrap();

        // Swap the data directory for a plain file so the next write fails.
        std::fs::remove_dir_all(&data_dir).unwrap();
        std::fs::write(&data_dir, "not a directory").unwrap();

        let lost = record("lost", "code0002");
        let err = index.upsert(lost.clone()).await.unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert!(index.get_by_id(&lost.id).await.unwrap().is_none());

        let err = index.delete(&kept.id).await.unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert_eq!(index.get_by_id(&kept.id).await.unwrap(), Some(kept));
    }
}
