//! Patient intake orchestration.
//!
//! [`IntakeService`] validates candidates before the store sees them, writes
//! through the configured [`RecordStore`](intake_storage::RecordStore), and
//! records every failed durable write in the error log.

use std::sync::Arc;

use intake_storage::{DynRecordStore, NameQuery, PatientDraft, StorageError, StoredRecord};
use tracing::{debug, error, info};

use crate::error_log::{ErrorLog, FailureRecord};

#[derive(Clone)]
pub struct IntakeService {
    store: DynRecordStore,
    error_log: Arc<dyn ErrorLog>,
}

impl IntakeService {
    pub fn new(store: DynRecordStore, error_log: Arc<dyn ErrorLog>) -> Self {
        Self { store, error_log }
    }

    pub fn store(&self) -> &DynRecordStore {
        &self.store
    }

    /// Validate and persist a new patient record.
    ///
    /// Storage failures are written to the error log before being returned.
    pub async fn create(&self, draft: &PatientDraft) -> Result<StoredRecord, StorageError> {
        if let Err(err) = draft.validate() {
            debug!(error = %err, "Rejected incomplete patient record");
            return Err(err);
        }

        match self.store.create(draft).await {
            Ok(stored) => {
                info!(
                    id = %stored.id,
                    backend = self.store.backend_name(),
                    "Patient record stored"
                );
                Ok(stored)
            }
            Err(err) => {
                if !err.is_client_error() {
                    self.report_failure(&err, draft).await;
                }
                Err(err)
            }
        }
    }

    /// Search by first or last name. A missing or empty name is rejected
    /// before the store is consulted.
    pub async fn search(&self, name: Option<&str>) -> Result<Vec<StoredRecord>, StorageError> {
        let query = NameQuery::parse(name.unwrap_or_default())?;
        let hits = self.store.search(query.as_str()).await.inspect_err(|err| {
            if !err.is_client_error() {
                let details = err.details();
                error!(
                    code = %details.code,
                    path = ?details.path,
                    backend = self.store.backend_name(),
                    error = %err,
                    "Patient search failed"
                );
            }
        })?;
        debug!(query = query.as_str(), hits = hits.len(), "Patient search");
        Ok(hits)
    }

    async fn report_failure(&self, err: &StorageError, draft: &PatientDraft) {
        let entry = FailureRecord::new(err, draft);
        error!(
            code = %entry.code,
            path = ?entry.path,
            backend = self.store.backend_name(),
            error = %err,
            "Failed to persist patient record"
        );

        if let Err(log_err) = self.error_log.record(&entry).await {
            error!(
                error = %log_err,
                original_error = %err,
                code = %entry.code,
                "Failed to write error log entry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_log::ErrorLogError;
    use async_trait::async_trait;
    use intake_storage::{PatientRecord, RecordId, RecordStore};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store double that counts calls and fails writes on demand.
    #[derive(Default)]
    struct ScriptedStore {
        calls: AtomicUsize,
        fail_writes: bool,
    }

    #[async_trait]
    impl RecordStore for ScriptedStore {
        async fn create(&self, draft: &PatientDraft) -> Result<StoredRecord, StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let record = draft.validate()?;
            if self.fail_writes {
                let io = std::io::Error::from_raw_os_error(28);
                return Err(StorageError::io("/data/patients.json", io));
            }
            Ok(StoredRecord::new(RecordId::Ordinal(0), record))
        }

        async fn search(&self, name_part: &str) -> Result<Vec<StoredRecord>, StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            NameQuery::parse(name_part)?;
            Ok(Vec::new())
        }

        async fn ping(&self) -> Result<(), StorageError> {
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "scripted"
        }
    }

    #[derive(Default)]
    struct RecordingLog {
        entries: Mutex<Vec<FailureRecord>>,
        broken: bool,
    }

    #[async_trait]
    impl ErrorLog for RecordingLog {
        async fn record(&self, entry: &FailureRecord) -> Result<(), ErrorLogError> {
            if self.broken {
                return Err(ErrorLogError::Io {
                    path: "/var/log/intake.log".into(),
                    source: std::io::Error::from_raw_os_error(30),
                });
            }
            self.entries.lock().push(entry.clone());
            Ok(())
        }
    }

    fn ann() -> PatientDraft {
        PatientRecord {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            dob: "1990-01-01".into(),
            gender: "F".into(),
            contact_number: "555-0100".into(),
            email: "a@x.com".into(),
            address: "1 Main St".into(),
        }
        .into()
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_store() {
        let store = Arc::new(ScriptedStore::default());
        let log = Arc::new(RecordingLog::default());
        let service = IntakeService::new(store.clone(), log.clone());

        let bob = PatientDraft {
            first_name: Some("Bob".into()),
            ..Default::default()
        };
        let err = service.create(&bob).await.unwrap_err();
        match err {
            StorageError::Validation { missing } => assert_eq!(missing.len(), 6),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
        assert!(log.entries.lock().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_is_logged_with_details() {
        let store = Arc::new(ScriptedStore {
            fail_writes: true,
            ..Default::default()
        });
        let log = Arc::new(RecordingLog::default());
        let service = IntakeService::new(store, log.clone());

        let err = service.create(&ann()).await.unwrap_err();
        assert!(!err.is_client_error());

        let entries = log.entries.lock();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].code, "ENOSPC");
        assert_eq!(entries[0].path.as_deref(), Some("/data/patients.json"));
        assert_eq!(entries[0].record, ann());
    }

    #[tokio::test]
    async fn test_broken_error_log_still_returns_storage_error() {
        let store = Arc::new(ScriptedStore {
            fail_writes: true,
            ..Default::default()
        });
        let log = Arc::new(RecordingLog {
            broken: true,
            ..Default::default()
        });
        let service = IntakeService::new(store, log);

        let err = service.create(&ann()).await.unwrap_err();
        assert_eq!(err.details().code, "ENOSPC");
    }

    #[tokio::test]
    async fn test_missing_name_rejected_before_store() {
        let store = Arc::new(ScriptedStore::default());
        let service = IntakeService::new(store.clone(), Arc::new(RecordingLog::default()));

        assert!(matches!(
            service.search(None).await,
            Err(StorageError::InvalidQuery { .. })
        ));
        assert!(matches!(
            service.search(Some("")).await,
            Err(StorageError::InvalidQuery { .. })
        ));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);

        assert!(service.search(Some("lee")).await.unwrap().is_empty());
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }
}
