use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use intake_storage::{PatientDraft, PatientRecord, RecordId, StorageError, StoredRecord};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::options::{FileStoreOptions, WriteMode};

/// File-backed patient record store.
///
/// This storage implementation provides:
/// - The full record sequence in memory, loaded once at open
/// - Whole-file JSON rewrite on every create, serialized by a write lock
/// - Searches served from memory without touching disk
/// - Ordinal position as the record identifier
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    pub(crate) inner: Arc<Inner>,
}

#[derive(Debug)]
pub(crate) struct Inner {
    path: PathBuf,
    write_mode: WriteMode,
    pub(crate) records: RwLock<Vec<PatientRecord>>,
}

impl FileRecordStore {
    /// Opens the store, loading whatever the file currently holds.
    ///
    /// A missing file yields an empty store. An unreadable or malformed file
    /// is logged and also yields an empty store.
    pub async fn open(options: FileStoreOptions) -> Self {
        let records = load_records(&options.path).await;
        info!(
            path = %options.path.display(),
            records = records.len(),
            write_mode = ?options.write_mode,
            "File record store opened"
        );
        Self::from_parts(options, records)
    }

    /// Creates a store over the given records without reading the file.
    #[must_use]
    pub fn from_parts(options: FileStoreOptions, records: Vec<PatientRecord>) -> Self {
        Self {
            inner: Arc::new(Inner {
                path: options.path,
                write_mode: options.write_mode,
                records: RwLock::new(records),
            }),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub async fn len(&self) -> usize {
        self.inner.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.records.read().await.is_empty()
    }

    /// Returns a copy of every record in store order.
    pub async fn snapshot(&self) -> Vec<StoredRecord> {
        let records = self.inner.records.read().await;
        records
            .iter()
            .enumerate()
            .map(|(pos, record)| StoredRecord::new(RecordId::Ordinal(pos as u64), record.clone()))
            .collect()
    }
}

impl Inner {
    /// Appends a record and rewrites the file while holding the write lock.
    ///
    /// The append is undone if the write fails.
    pub(crate) async fn append(&self, record: PatientRecord) -> Result<StoredRecord, StorageError> {
        let mut records = self.records.write().await;
        records.push(record);

        if let Err(e) = self.persist(&records).await {
            records.pop();
            return Err(e);
        }

        let position = records.len() - 1;
        let stored = StoredRecord::new(RecordId::Ordinal(position as u64), records[position].clone());
        debug!(position, path = %self.path.display(), "Record persisted");
        Ok(stored)
    }

    async fn persist(&self, records: &[PatientRecord]) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(records)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;
        }

        match self.write_mode {
            WriteMode::Overwrite => tokio::fs::write(&self.path, &bytes)
                .await
                .map_err(|e| StorageError::io(&self.path, e)),
            WriteMode::AtomicRename => {
                let tmp = temp_path(&self.path);
                let result = write_synced(&tmp, &bytes).await;
                let result = match result {
                    Ok(()) => tokio::fs::rename(&tmp, &self.path)
                        .await
                        .map_err(|e| StorageError::io(&self.path, e)),
                    Err(e) => Err(e),
                };
                if result.is_err() {
                    let _ = tokio::fs::remove_file(&tmp).await;
                }
                result
            }
        }
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| StorageError::io(path, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| StorageError::io(path, e))?;
    file.sync_all().await.map_err(|e| StorageError::io(path, e))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "records.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Reads the record file, falling back to an empty sequence on any problem.
pub(crate) async fn load_records(path: &Path) -> Vec<PatientRecord> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "No record file yet, starting empty");
            return Vec::new();
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read record file, starting empty");
            return Vec::new();
        }
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        warn!(path = %path.display(), "Record file is empty, starting empty");
        return Vec::new();
    }

    let records: Vec<PatientRecord> = match serde_json::from_slice(&bytes) {
        Ok(records) => records,
        Err(e) => {
            error!(path = %path.display(), error = %e, "Record file is malformed, starting empty");
            return Vec::new();
        }
    };

    if let Some((pos, err)) = records
        .iter()
        .enumerate()
        .find_map(|(pos, r)| PatientDraft::from(r.clone()).validate().err().map(|e| (pos, e)))
    {
        error!(
            path = %path.display(),
            position = pos,
            error = %err,
            "Record file holds an incomplete record, starting empty"
        );
        return Vec::new();
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(first: &str, last: &str) -> PatientRecord {
        PatientRecord {
            first_name: first.into(),
            last_name: last.into(),
            dob: "1990-01-01".into(),
            gender: "F".into(),
            contact_number: "555-0100".into(),
            email: "a@x.com".into(),
            address: "1 Main St".into(),
        }
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let records = load_records(&dir.path().join("absent.json")).await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_load_malformed_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("patients.json");
        tokio::fs::write(&path, b"[{\"firstName\": ").await.unwrap();
        assert!(load_records(&path).await.is_empty());
    }

    #[tokio::test]
    async fn test_load_incomplete_record_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("patients.json");
        let mut bad = serde_json::to_value(vec![record("Ann", "Lee")]).unwrap();
        bad[0]["email"] = serde_json::json!("");
        tokio::fs::write(&path, bad.to_string()).await.unwrap();
        assert!(load_records(&path).await.is_empty());
    }

    #[tokio::test]
    async fn test_load_whitespace_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("patients.json");
        tokio::fs::write(&path, b"  \n").await.unwrap();
        assert!(load_records(&path).await.is_empty());
    }

    #[tokio::test]
    async fn test_append_writes_full_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("patients.json");
        let store = FileRecordStore::from_parts(FileStoreOptions::new(&path), Vec::new());

        store.inner.append(record("Ann", "Lee")).await.unwrap();
        let stored = store.inner.append(record("Bob", "Smith")).await.unwrap();
        assert_eq!(stored.id, RecordId::Ordinal(1));

        let on_disk: Vec<PatientRecord> =
            serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
        assert_eq!(on_disk, vec![record("Ann", "Lee"), record("Bob", "Smith")]);
    }

    #[tokio::test]
    async fn test_atomic_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("patients.json");
        let options = FileStoreOptions::new(&path).with_write_mode(WriteMode::AtomicRename);
        let store = FileRecordStore::from_parts(options, Vec::new());

        store.inner.append(record("Ann", "Lee")).await.unwrap();

        assert!(path.exists());
        assert!(!temp_path(&path).exists());
        assert_eq!(load_records(&path).await, vec![record("Ann", "Lee")]);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes every write fail.
        let path = dir.path().join("patients.json");
        tokio::fs::create_dir(&path).await.unwrap();
        let store = FileRecordStore::from_parts(FileStoreOptions::new(&path), Vec::new());

        let err = store.inner.append(record("Ann", "Lee")).await.unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path(Path::new("/data/patients.json"));
        assert_eq!(tmp, PathBuf::from("/data/patients.json.tmp"));
    }
}
