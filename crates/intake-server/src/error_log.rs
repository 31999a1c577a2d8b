//! Append-only log of failed writes.
//!
//! Each failure becomes one JSON object on its own line, carrying the
//! attempted record together with the code, location and source chain of
//! the underlying storage error.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use intake_storage::{PatientDraft, StorageError};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum ErrorLogError {
    #[error("failed to write error log {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode failure record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One entry in the error log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub timestamp: String,
    pub message: String,
    pub code: String,
    pub path: Option<String>,
    pub stack: Vec<String>,
    pub record: PatientDraft,
}

impl FailureRecord {
    pub fn new(err: &StorageError, attempted: &PatientDraft) -> Self {
        let details = err.details();
        let now = OffsetDateTime::now_utc();
        let timestamp = now
            .format(&Rfc3339)
            .unwrap_or_else(|_| now.unix_timestamp().to_string());
        Self {
            timestamp,
            message: details.message,
            code: details.code,
            path: details.path,
            stack: err.chain(),
            record: attempted.clone(),
        }
    }
}

#[async_trait]
pub trait ErrorLog: Send + Sync {
    async fn record(&self, entry: &FailureRecord) -> Result<(), ErrorLogError>;
}

/// Writes failure records as JSON lines to a file.
pub struct FileErrorLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, line: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line).await?;
        file.flush().await
    }
}

#[async_trait]
impl ErrorLog for FileErrorLog {
    async fn record(&self, entry: &FailureRecord) -> Result<(), ErrorLogError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        // Lines from concurrent failures must not interleave.
        let _guard = self.write_lock.lock().await;
        self.append(&line).await.map_err(|source| ErrorLogError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
