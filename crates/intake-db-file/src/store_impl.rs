//! Implementation of the RecordStore trait for FileRecordStore.

use async_trait::async_trait;

use intake_storage::{NameQuery, PatientDraft, RecordId, RecordStore, StorageError, StoredRecord};

use crate::storage::FileRecordStore;

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn create(&self, draft: &PatientDraft) -> Result<StoredRecord, StorageError> {
        let record = draft.validate()?;

        // The append-and-rewrite runs in its own task so that a caller dropping
        // this future cannot cancel it halfway through the file write.
        let inner = self.inner.clone();
        tokio::spawn(async move { inner.append(record).await })
            .await
            .map_err(|e| StorageError::unavailable(format!("file writer task failed: {e}")))?
    }

    async fn search(&self, name_part: &str) -> Result<Vec<StoredRecord>, StorageError> {
        let query = NameQuery::parse(name_part)?;
        let records = self.inner.records.read().await;

        Ok(records
            .iter()
            .enumerate()
            .filter(|(_, record)| query.matches(record))
            .map(|(pos, record)| StoredRecord::new(RecordId::Ordinal(pos as u64), record.clone()))
            .collect())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FileStoreOptions;
    use serde_json::json;
    use tempfile::TempDir;

    fn draft(first: &str, last: &str) -> PatientDraft {
        serde_json::from_value(json!({
            "firstName": first,
            "lastName": last,
            "dob": "1990-01-01",
            "gender": "F",
            "contactNumber": "555-0100",
            "email": "a@x.com",
            "address": "1 Main St"
        }))
        .unwrap()
    }

    async fn open(dir: &TempDir) -> FileRecordStore {
        FileRecordStore::open(FileStoreOptions::new(dir.path().join("patients.json"))).await
    }

    #[tokio::test]
    async fn test_create_then_search() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;

        let created = store.create(&draft("Ann", "Lee")).await.unwrap();
        assert_eq!(created.id, RecordId::Ordinal(0));

        let hits = store.search("lee").await.unwrap();
        assert_eq!(hits, vec![created]);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_fields() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;

        let partial: PatientDraft = serde_json::from_value(json!({"firstName": "Bob"})).unwrap();
        let err = store.create(&partial).await.unwrap_err();

        assert!(matches!(err, StorageError::Validation { .. }));
        assert!(store.is_empty().await);
        assert!(!dir.path().join("patients.json").exists());
    }

    #[tokio::test]
    async fn test_whitespace_value_is_stored() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;

        let mut spaced = draft("Ann", "Lee");
        spaced.dob = Some(" ".to_string());
        let created = store.create(&spaced).await.unwrap();
        assert_eq!(created.record.dob, " ");

        let hits = store.search("lee").await.unwrap();
        assert_eq!(hits, vec![created]);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;
        store.create(&draft("John", "Smith")).await.unwrap();
        store.create(&draft("Smitty", "Jones")).await.unwrap();
        store.create(&draft("Ann", "Lee")).await.unwrap();

        let lower = store.search("smith").await.unwrap();
        let upper = store.search("SMITH").await.unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.len(), 1);

        let ids: Vec<_> = store.search("smi").await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RecordId::Ordinal(0), RecordId::Ordinal(1)]);
    }

    #[tokio::test]
    async fn test_record_matching_both_names_appears_once() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;
        store.create(&draft("Lee", "Lee")).await.unwrap();

        assert_eq!(store.search("lee").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_empty_query_and_no_match() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;
        store.create(&draft("Ann", "Lee")).await.unwrap();

        assert!(matches!(
            store.search("").await,
            Err(StorageError::InvalidQuery { .. })
        ));
        assert!(store.search("zzz").await.unwrap().is_empty());
    }
}
