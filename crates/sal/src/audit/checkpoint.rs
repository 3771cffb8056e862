//! Audit checkpoints and their storage.
//!
//! A checkpoint holds the full record list of a dataset, how far the audit
//! has progressed, the decision trail, and the lease of the session that is
//! currently working on it. It is rewritten after every decision.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, SalError};
use crate::record::CanonicalRecord;

use super::decision::AuditDecision;

/// Format version written into every checkpoint.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Persisted audit progress for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,

    /// Dataset identifier (input file stem).
    pub dataset: String,

    /// Fingerprint of the source file the records came from.
    pub source_hash: String,

    /// Every record of the dataset; those before `resume_index` are audited.
    pub records: Vec<CanonicalRecord>,

    /// Index of the next record to confirm.
    pub resume_index: usize,

    #[serde(default)]
    pub decisions: Vec<AuditDecision>,

    /// Session currently holding the dataset, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease: Option<SessionLease>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    /// A fresh checkpoint with nothing audited.
    pub fn new(
        dataset: impl Into<String>,
        source_hash: impl Into<String>,
        records: Vec<CanonicalRecord>,
    ) -> Self {
        let now = Utc::now();
        Self {
            version: CHECKPOINT_VERSION,
            dataset: dataset.into(),
            source_hash: source_hash.into(),
            records,
            resume_index: 0,
            decisions: Vec::new(),
            lease: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// Every record has been confirmed.
    pub fn is_complete(&self) -> bool {
        self.resume_index >= self.records.len()
    }

    /// Number of records marked audited.
    pub fn audited_count(&self) -> usize {
        self.records.iter().filter(|r| r.audited).count()
    }

    /// Bump the modification time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Marks a checkpoint as owned by a running session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLease {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Process that took the lease.
    pub pid: u32,
}

impl SessionLease {
    /// A lease for a new session in this process.
    pub fn acquire() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            pid: std::process::id(),
        }
    }
}

/// Storage for checkpoints, keyed by dataset.
pub trait CheckpointStore {
    /// Load the checkpoint for `dataset`, or `None` if there is none.
    fn load(&self, dataset: &str) -> Result<Option<Checkpoint>>;

    /// Replace the checkpoint for `dataset`. Either the new state is stored
    /// completely or the previous one is left in place.
    fn save(&self, dataset: &str, checkpoint: &Checkpoint) -> Result<()>;

    fn exists(&self, dataset: &str) -> bool;

    /// Move the checkpoint out of the active set, keeping it for reference.
    fn archive(&self, dataset: &str) -> Result<()>;
}

/// Clear the lease on `dataset` if `session_id` still holds it.
///
/// Used from contexts that cannot reach the owning session, such as an
/// interrupt handler. Returns whether a lease was released.
pub fn release_lease<S: CheckpointStore + ?Sized>(
    store: &S,
    dataset: &str,
    session_id: Uuid,
) -> Result<bool> {
    let Some(mut checkpoint) = store.load(dataset)? else {
        return Ok(false);
    };
    match &checkpoint.lease {
        Some(lease) if lease.session_id == session_id => {
            checkpoint.lease = None;
            checkpoint.touch();
            store.save(dataset, &checkpoint)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// JSON checkpoints in a work directory.
///
/// ```text
/// tmp/
/// ├── audit-checkpoint-LoC_1.json
/// └── history/
///     └── audit-checkpoint-LoC_1.2024-12-30T10-00-00.json
/// ```
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the active checkpoint for `dataset`.
    pub fn path(&self, dataset: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(dataset)))
    }

    pub fn history_dir(&self) -> PathBuf {
        self.dir.join("history")
    }

    /// Archived checkpoints for `dataset`, newest first.
    pub fn list_history(&self, dataset: &str) -> Result<Vec<PathBuf>> {
        let history_dir = self.history_dir();
        if !history_dir.exists() {
            return Ok(Vec::new());
        }

        let prefix = format!("{}.", file_stem(dataset));
        let mut entries: Vec<PathBuf> = fs::read_dir(&history_dir)
            .map_err(|e| SalError::io(&history_dir, e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter(|path| {
                path.file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with(&prefix))
            })
            .collect();

        // Timestamped names sort chronologically
        entries.sort_by(|a, b| b.cmp(a));
        Ok(entries)
    }

    fn read(path: &Path) -> Result<Checkpoint> {
        let file = File::open(path).map_err(|e| SalError::io(path, e))?;
        let checkpoint: Checkpoint =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                SalError::Persistence(format!(
                    "Failed to parse checkpoint '{}': {}",
                    path.display(),
                    e
                ))
            })?;

        if checkpoint.version > CHECKPOINT_VERSION {
            return Err(SalError::Persistence(format!(
                "Checkpoint '{}' has version {}, newer than supported version {}",
                path.display(),
                checkpoint.version,
                CHECKPOINT_VERSION
            )));
        }
        Ok(checkpoint)
    }
}

fn file_stem(dataset: &str) -> String {
    format!("audit-checkpoint-{}", dataset)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| {
            SalError::Persistence(format!(
                "Failed to create directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
    }
    Ok(())
}

/// Write `value` as pretty JSON to `path` through a temporary file in the
/// same directory, so readers see either the old or the new content.
///
/// Each call gets its own temporary name; an interrupt handler and the
/// main thread may save the same checkpoint at once.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(
        ".{}.{}.{}.tmp",
        file_name,
        std::process::id(),
        Uuid::new_v4().simple()
    ));

    let written = write_synced(&tmp, value)
        .and_then(|()| fs::rename(&tmp, path).map_err(|e| SalError::io(path, e)));
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}

fn write_synced<T: Serialize + ?Sized>(tmp: &Path, value: &T) -> Result<()> {
    let file = File::create(tmp).map_err(|e| SalError::io(tmp, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| SalError::Persistence(format!("Failed to serialize JSON: {}", e)))?;
    writer.flush().map_err(|e| SalError::io(tmp, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| SalError::io(tmp, e))
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self, dataset: &str) -> Result<Option<Checkpoint>> {
        let path = self.path(dataset);
        if !path.exists() {
            return Ok(None);
        }
        Self::read(&path).map(Some)
    }

    fn save(&self, dataset: &str, checkpoint: &Checkpoint) -> Result<()> {
        ensure_dir(&self.dir)?;
        let path = self.path(dataset);
        write_json_atomic(&path, checkpoint)?;
        debug!(
            dataset,
            resume_index = checkpoint.resume_index,
            "saved checkpoint {}",
            path.display()
        );
        Ok(())
    }

    fn exists(&self, dataset: &str) -> bool {
        self.path(dataset).exists()
    }

    fn archive(&self, dataset: &str) -> Result<()> {
        let path = self.path(dataset);
        let Some(checkpoint) = self.load(dataset)? else {
            return Ok(());
        };

        let history_dir = self.history_dir();
        ensure_dir(&history_dir)?;

        let timestamp = checkpoint.updated_at.format("%Y-%m-%dT%H-%M-%S");
        let target = history_dir.join(format!("{}.{}.json", file_stem(dataset), timestamp));
        fs::rename(&path, &target).map_err(|e| SalError::io(&target, e))?;

        debug!(dataset, "archived checkpoint to {}", target.display());
        Ok(())
    }
}

/// Checkpoints held in memory, for tests and scripted runs.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    active: RefCell<HashMap<String, Checkpoint>>,
    archived: RefCell<Vec<Checkpoint>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checkpoints moved out by [`CheckpointStore::archive`], oldest first.
    pub fn archived(&self) -> Vec<Checkpoint> {
        self.archived.borrow().clone()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self, dataset: &str) -> Result<Option<Checkpoint>> {
        Ok(self.active.borrow().get(dataset).cloned())
    }

    fn save(&self, dataset: &str, checkpoint: &Checkpoint) -> Result<()> {
        self.active
            .borrow_mut()
            .insert(dataset.to_string(), checkpoint.clone());
        Ok(())
    }

    fn exists(&self, dataset: &str) -> bool {
        self.active.borrow().contains_key(dataset)
    }

    fn archive(&self, dataset: &str) -> Result<()> {
        if let Some(checkpoint) = self.active.borrow_mut().remove(dataset) {
            self.archived.borrow_mut().push(checkpoint);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::record;

    fn sample() -> Checkpoint {
        Checkpoint::new(
            "LoC_1",
            "sha256:abc",
            vec![record(2, 1, 2), record(3, 3, 4)],
        )
    }

    #[test]
    fn test_new_checkpoint() {
        let cp = sample();
        assert_eq!(cp.version, CHECKPOINT_VERSION);
        assert_eq!(cp.total(), 2);
        assert_eq!(cp.resume_index, 0);
        assert!(!cp.is_complete());
        assert_eq!(cp.audited_count(), 0);
        assert!(cp.lease.is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("tmp"));
        assert!(!store.exists("LoC_1"));
        assert!(store.load("LoC_1").unwrap().is_none());

        let mut cp = sample();
        cp.lease = Some(SessionLease::acquire());
        store.save("LoC_1", &cp).unwrap();

        assert!(store.exists("LoC_1"));
        assert_eq!(store.load("LoC_1").unwrap(), Some(cp));
        assert!(temp_files(store.dir()).is_empty());
    }

    fn temp_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "tmp"))
            .collect()
    }

    #[test]
    fn test_concurrent_saves_use_separate_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let mut leased = sample();
        leased.lease = Some(SessionLease::acquire());
        let released = sample();

        std::thread::scope(|scope| {
            let writers: Vec<_> = [&leased, &released]
                .into_iter()
                .map(|cp| {
                    let store = store.clone();
                    scope.spawn(move || {
                        for _ in 0..25 {
                            store.save("LoC_1", cp)?;
                        }
                        Ok::<(), SalError>(())
                    })
                })
                .collect();
            for writer in writers {
                writer.join().unwrap().unwrap();
            }
        });

        let saved = store.load("LoC_1").unwrap().unwrap();
        assert!(saved == leased || saved == released);
        assert!(temp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("occupied");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "").unwrap();

        assert!(write_json_atomic(&target, &sample()).is_err());
        assert!(target.join("keep").exists());
        assert!(temp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_file_store_archive() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        store.save("LoC_1", &sample()).unwrap();
        store.archive("LoC_1").unwrap();

        assert!(!store.exists("LoC_1"));
        let history = store.list_history("LoC_1").unwrap();
        assert_eq!(history.len(), 1);
        assert!(store.list_history("LoC_2").unwrap().is_empty());

        // Nothing to archive is not an error
        store.archive("LoC_1").unwrap();
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        fs::write(store.path("LoC_1"), "{ not json").unwrap();
        assert!(matches!(
            store.load("LoC_1"),
            Err(SalError::Persistence(_))
        ));
    }

    #[test]
    fn test_file_store_rejects_newer_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let mut cp = sample();
        cp.version = CHECKPOINT_VERSION + 1;
        store.save("LoC_1", &cp).unwrap();
        assert!(matches!(
            store.load("LoC_1"),
            Err(SalError::Persistence(_))
        ));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryCheckpointStore::new();
        store.save("a", &sample()).unwrap();
        assert!(store.exists("a"));
        store.archive("a").unwrap();
        assert!(!store.exists("a"));
        assert_eq!(store.archived().len(), 1);
    }

    #[test]
    fn test_release_lease_only_for_owner() {
        let store = MemoryCheckpointStore::new();
        let mut cp = sample();
        let lease = SessionLease::acquire();
        let owner = lease.session_id;
        cp.lease = Some(lease);
        store.save("a", &cp).unwrap();

        assert!(!release_lease(&store, "a", Uuid::new_v4()).unwrap());
        assert!(store.load("a").unwrap().unwrap().lease.is_some());

        assert!(release_lease(&store, "a", owner).unwrap());
        assert!(store.load("a").unwrap().unwrap().lease.is_none());
        assert!(!release_lease(&store, "missing", owner).unwrap());
    }
}
