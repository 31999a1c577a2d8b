//! JSON file storage backend for the patient intake service.
//!
//! This crate provides a file-backed implementation of the `RecordStore` trait
//! from `intake-storage`. The full record sequence lives in memory behind a
//! tokio `RwLock` and is rewritten to a single JSON array file on every create.
//!
//! # Example
//!
//! ```ignore
//! use intake_db_file::{FileRecordStore, FileStoreOptions};
//! use intake_storage::RecordStore;
//!
//! let store = FileRecordStore::open(FileStoreOptions::new("data/patients.json")).await;
//! let hits = store.search("lee").await?;
//! ```

pub mod options;
pub mod storage;
mod store_impl;

pub use intake_storage::{RecordStore, StorageError, StoredRecord};

pub use options::{FileStoreOptions, WriteMode};
pub use storage::FileRecordStore;

/// Opens a file store and wraps it for sharing across tasks.
pub async fn open_record_store(options: FileStoreOptions) -> intake_storage::DynRecordStore {
    std::sync::Arc::new(FileRecordStore::open(options).await)
}
