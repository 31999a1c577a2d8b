//! Storage traits for the record store abstraction layer.
//!
//! This module defines the core trait that all storage backends must implement.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::{PatientDraft, StoredRecord};

/// The storage trait that all patient record backends must implement.
///
/// Implementations must be thread-safe (`Send + Sync`). A record becomes
/// visible to [`search`](RecordStore::search) exactly when its
/// [`create`](RecordStore::create) call has returned successfully.
///
/// # Example
///
/// ```ignore
/// use intake_storage::{RecordStore, StorageError, StoredRecord};
///
/// async fn find_lee(store: &dyn RecordStore) -> Result<Vec<StoredRecord>, StorageError> {
///     store.search("lee").await
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Validates and durably stores a new record.
    ///
    /// The record is persisted before this method returns. The returned
    /// [`StoredRecord`] carries the backend-assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` if any required field is missing.
    /// Returns `StorageError::Io`, `Serialization` or `Database` if the write fails.
    /// Returns `StorageError::Unavailable` if the backend cannot be reached.
    async fn create(&self, draft: &PatientDraft) -> Result<StoredRecord, StorageError>;

    /// Returns every record whose first or last name contains `name_part`,
    /// ignoring case, in store order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidQuery` if `name_part` is empty.
    /// Returns an error for infrastructure issues; no match is not an error.
    async fn search(&self, name_part: &str) -> Result<Vec<StoredRecord>, StorageError>;

    /// Checks that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if it is not.
    async fn ping(&self) -> Result<(), StorageError>;

    /// Returns the name of this storage backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
