use crate::error::{Result, ServiceError, Stage};
use crate::outcome::{ConsistencyReport, SaveOutcome};
use dashmap::DashMap;
use jiff::{SignedDuration, Timestamp};
use protolink_core::{
    BlobStore, Clock, FileSet, MetadataIndex, Page, PageRequest, PrototypeId, PrototypeRecord,
    ShortCode, SystemClock,
};
use protolink_generator::Generator;
use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

/// Name given to uploads that arrive without one.
pub const UNTITLED_PROTOTYPE: &str = "Untitled prototype";

/// How many codes are minted for a new prototype before giving up.
pub const MAX_MINT_ATTEMPTS: usize = 4;

/// Saves, resolves and removes prototypes.
///
/// A prototype is identified by its logical name: saving under a name that
/// is already taken replaces the stored files and keeps the id and short
/// code. Saves and deletes of the same name are serialized within one
/// service (and its clones); different names proceed concurrently.
///
/// Files are written before the index is updated, so a short code is only
/// ever handed out for files that are fully on disk.
pub struct PrototypeService<I, B, G, C = SystemClock> {
    index: Arc<I>,
    blobs: Arc<B>,
    generator: Arc<G>,
    clock: Arc<C>,
    name_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl<I, B, G, C> Clone for PrototypeService<I, B, G, C> {
    fn clone(&self) -> Self {
        Self {
            index: Arc::clone(&self.index),
            blobs: Arc::clone(&self.blobs),
            generator: Arc::clone(&self.generator),
            clock: Arc::clone(&self.clock),
            name_locks: Arc::clone(&self.name_locks),
        }
    }
}

impl<I: MetadataIndex, B: BlobStore, G: Generator> PrototypeService<I, B, G> {
    pub fn new(index: I, blobs: B, generator: G) -> Self {
        Self::with_clock(index, blobs, generator, SystemClock)
    }
}

impl<I, B, G, C> PrototypeService<I, B, G, C>
where
    I: MetadataIndex,
    B: BlobStore,
    G: Generator,
    C: Clock,
{
    pub fn with_clock(index: I, blobs: B, generator: G, clock: C) -> Self {
        Self {
            index: Arc::new(index),
            blobs: Arc::new(blobs),
            generator: Arc::new(generator),
            clock: Arc::new(clock),
            name_locks: Arc::new(DashMap::new()),
        }
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    /// Stores `files` as the prototype called `name`.
    ///
    /// A missing or blank name is replaced by [`UNTITLED_PROTOTYPE`]. The
    /// file set must not be empty and every path must be a valid relative
    /// path; both are checked before anything is written.
    ///
    /// If a prototype with this name exists, its files are replaced and its
    /// id and short code are reused. Otherwise a new id is assigned and a
    /// fresh short code is minted.
    pub async fn save(&self, name: Option<&str>, files: &FileSet) -> Result<SaveOutcome> {
        if files.is_empty() {
            return Err(ServiceError::Validation(
                "a prototype needs at least one file".to_string(),
            ));
        }
        files.resolve_paths()?;

        let name = match name {
            Some(name) if !name.trim().is_empty() => name,
            _ => UNTITLED_PROTOTYPE,
        };

        self.with_name_lock(name, self.save_locked(name, files))
            .await
    }

    async fn save_locked(&self, name: &str, files: &FileSet) -> Result<SaveOutcome> {
        let existing = self
            .index
            .get_by_name(name)
            .await
            .map_err(ServiceError::storage(Stage::IndexLookup))?;

        match existing {
            Some(previous) => self.overwrite(previous, files).await,
            None => self.create(name, files).await,
        }
    }

    async fn overwrite(&self, previous: PrototypeRecord, files: &FileSet) -> Result<SaveOutcome> {
        self.blobs
            .replace(&previous.id, files)
            .await
            .map_err(ServiceError::storage(Stage::BlobWrite))?;

        let record = PrototypeRecord {
            updated_at: next_update(previous.updated_at, self.clock.now()),
            ..previous
        };

        if let Err(e) = self.index.upsert(record.clone()).await {
            warn!(id = %record.id, error = %e, "files replaced but index record not updated");
            return Err(ServiceError::storage(Stage::IndexUpsert)(e));
        }

        info!(
            id = %record.id,
            code = %record.short_code,
            name = %record.name,
            files = files.len(),
            "prototype overwritten"
        );

        Ok(SaveOutcome {
            id: record.id,
            short_code: record.short_code.clone(),
            overwritten: true,
            record,
        })
    }

    async fn create(&self, name: &str, files: &FileSet) -> Result<SaveOutcome> {
        let id = PrototypeId::new();
        let short_code = self.mint_code(name).await?;

        if let Err(e) = self.blobs.write(&id, files).await {
            self.discard_files(&id).await;
            return Err(ServiceError::storage(Stage::BlobWrite)(e));
        }

        let now = self.clock.now();
        let record = PrototypeRecord {
            id,
            name: name.to_string(),
            short_code: short_code.clone(),
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.index.upsert(record.clone()).await {
            self.discard_files(&id).await;
            return Err(ServiceError::storage(Stage::IndexUpsert)(e));
        }

        info!(
            id = %id,
            code = %short_code,
            name = %name,
            files = files.len(),
            "prototype created"
        );

        Ok(SaveOutcome {
            id,
            short_code,
            overwritten: false,
            record,
        })
    }

    /// Mints a code that no record holds at the time of the check.
    async fn mint_code(&self, name: &str) -> Result<ShortCode> {
        for attempt in 1..=MAX_MINT_ATTEMPTS {
            let code: ShortCode = self.generator.generate(name).into();
            let taken = self
                .index
                .get_by_short_code(&code)
                .await
                .map_err(ServiceError::storage(Stage::IndexLookup))?
                .is_some();

            if !taken {
                return Ok(code);
            }
            debug!(code = %code, attempt, "minted short code is already taken");
        }

        Err(ServiceError::Conflict(format!(
            "no unused short code found after {MAX_MINT_ATTEMPTS} attempts"
        )))
    }

    async fn discard_files(&self, id: &PrototypeId) {
        if let Err(e) = self.blobs.remove(id).await {
            warn!(id = %id, error = %e, "failed to remove files of an unsaved prototype");
        }
    }

    /// Looks up the prototype a short code points at.
    ///
    /// Text that is not a well-formed short code cannot name a prototype and
    /// is reported as not found.
    pub async fn resolve(&self, code: &str) -> Result<PrototypeRecord> {
        let code = ShortCode::new(code).map_err(|e| {
            ServiceError::NotFound(format!("no prototype with short code '{code}' ({e})"))
        })?;
        let record = self
            .index
            .get_by_short_code(&code)
            .await
            .map_err(ServiceError::storage(Stage::IndexLookup))?;

        trace!(code = %code, found = record.is_some(), "resolved short code");
        record.ok_or_else(|| ServiceError::NotFound(format!("no prototype with short code '{code}'")))
    }

    pub async fn get(&self, id: &PrototypeId) -> Result<PrototypeRecord> {
        self.index
            .get_by_id(id)
            .await
            .map_err(ServiceError::storage(Stage::IndexLookup))?
            .ok_or_else(|| ServiceError::NotFound(format!("no prototype with id {id}")))
    }

    /// Lists prototypes newest first.
    pub async fn list(&self, request: PageRequest) -> Result<Page<PrototypeRecord>> {
        self.index
            .list(request)
            .await
            .map_err(ServiceError::storage(Stage::IndexLookup))
    }

    /// Deletes a prototype and its files.
    ///
    /// The record goes first so that no record ever points at a missing
    /// directory. If removing the files then fails, the directory is left as
    /// an orphan for [`check_consistency`][Self::check_consistency] to report.
    /// Returns `false` if no prototype has this id.
    pub async fn delete(&self, id: &PrototypeId) -> Result<bool> {
        let Some(record) = self
            .index
            .get_by_id(id)
            .await
            .map_err(ServiceError::storage(Stage::IndexLookup))?
        else {
            return Ok(false);
        };

        self.with_name_lock(&record.name, self.delete_locked(id))
            .await
    }

    async fn delete_locked(&self, id: &PrototypeId) -> Result<bool> {
        let removed = self
            .index
            .delete(id)
            .await
            .map_err(ServiceError::storage(Stage::IndexDelete))?;
        if !removed {
            return Ok(false);
        }

        self.blobs
            .remove(id)
            .await
            .map_err(ServiceError::storage(Stage::BlobRemove))?;

        info!(id = %id, "prototype deleted");
        Ok(true)
    }

    /// Compares the index with the blob store without changing either.
    pub async fn check_consistency(&self) -> Result<ConsistencyReport> {
        let records = self
            .index
            .all()
            .await
            .map_err(ServiceError::storage(Stage::ConsistencyScan))?;
        let directories: BTreeSet<PrototypeId> = self
            .blobs
            .list_ids()
            .await
            .map_err(ServiceError::storage(Stage::ConsistencyScan))?
            .into_iter()
            .collect();

        let known: HashSet<PrototypeId> = records.iter().map(|record| record.id).collect();

        let mut orphan_records: Vec<_> = records
            .into_iter()
            .filter(|record| !directories.contains(&record.id))
            .collect();
        orphan_records.sort_by(PrototypeRecord::recency_order);

        let orphan_directories: Vec<_> = directories
            .into_iter()
            .filter(|id| !known.contains(id))
            .collect();

        let report = ConsistencyReport {
            orphan_records,
            orphan_directories,
        };

        if report.is_consistent() {
            debug!("index and blob store agree");
        } else {
            warn!(
                orphan_records = report.orphan_records.len(),
                orphan_directories = report.orphan_directories.len(),
                "index and blob store disagree"
            );
        }

        Ok(report)
    }

    /// Directory holding the files of `id`.
    pub fn storage_path(&self, id: &PrototypeId) -> PathBuf {
        self.blobs.path_for(id)
    }

    /// Runs `op` while holding the lock for `name`.
    async fn with_name_lock<T>(&self, name: &str, op: impl Future<Output = T>) -> T {
        // dropped last, after the guard and our handle on the lock
        let _release = NameLockRelease {
            locks: &self.name_locks,
            name,
        };
        let lock = Arc::clone(
            self.name_locks
                .entry(name.to_string())
                .or_default()
                .value(),
        );

        let _guard = lock.lock().await;
        op.await
    }
}

/// Drops the lock entry for a name once nobody holds or waits for it.
///
/// Runs on completion and when a waiting future is dropped.
struct NameLockRelease<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    name: &'a str,
}

impl Drop for NameLockRelease<'_> {
    fn drop(&mut self) {
        self.locks
            .remove_if(self.name, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// The update time for a record last updated at `previous`: `now`, or one
/// nanosecond later than `previous` if the clock has not moved past it.
fn next_update(previous: Timestamp, now: Timestamp) -> Timestamp {
    if now > previous {
        return now;
    }
    previous
        .checked_add(SignedDuration::from_nanos(1))
        .unwrap_or(previous)
}
