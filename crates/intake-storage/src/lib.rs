//! # intake-storage
//!
//! Storage abstraction layer for the patient intake service.
//!
//! This crate defines the record types and the [`RecordStore`] trait that every
//! storage backend implements. It does not contain any backends - those live in
//! `intake-db-file` and `intake-db-postgres`.
//!
//! ## Example
//!
//! ```ignore
//! use intake_storage::{PatientDraft, RecordStore, StorageError, StoredRecord};
//!
//! async fn admit_and_find(
//!     store: &dyn RecordStore,
//!     draft: &PatientDraft,
//! ) -> Result<Vec<StoredRecord>, StorageError> {
//!     let stored = store.create(draft).await?;
//!     store.search(&stored.record.last_name).await
//! }
//! ```
//!
//! ## Storage Backends
//!
//! To implement a backend, implement [`RecordStore`]. Backends must call
//! [`PatientDraft::validate`] before persisting anything and may use
//! [`NameQuery`] to evaluate searches over in-memory data.

mod error;
mod query;
mod traits;
mod types;

pub use error::{ErrorDetails, StorageError};
pub use query::NameQuery;
pub use traits::RecordStore;
pub use types::{PatientDraft, PatientRecord, RecordId, StoredRecord};

/// Type alias for a shareable record store trait object.
pub type DynRecordStore = std::sync::Arc<dyn RecordStore>;
