//! Storage error types for the record store abstraction layer.
//!
//! This module defines all error types that can occur during storage operations.

use std::error::Error as _;
use std::path::PathBuf;

use serde::Serialize;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// One or more required fields are absent or empty.
    #[error("Missing required fields: {}", missing.join(", "))]
    Validation {
        /// Wire names of the missing fields.
        missing: Vec<&'static str>,
    },

    /// The search query is missing or empty.
    #[error("Invalid query: {message}")]
    InvalidQuery {
        /// Description of why the query is invalid.
        message: String,
    },

    /// Reading or writing the backing file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File the operation was acting on.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Records could not be encoded or decoded.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// The database rejected an operation.
    #[error("Database error ({code}) on {table}: {message}")]
    Database {
        /// Backend error code (SQLSTATE for PostgreSQL).
        code: String,
        /// Table the statement targeted.
        table: String,
        /// Backend-supplied message.
        message: String,
    },

    /// The storage backend cannot be reached.
    #[error("Storage unavailable: {message}")]
    Unavailable {
        /// Description of the connectivity problem.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(missing: Vec<&'static str>) -> Self {
        Self::Validation { missing }
    }

    /// Creates a new `InvalidQuery` error.
    #[must_use]
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Creates a new `Io` error.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a new `Serialization` error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a new `Database` error.
    #[must_use]
    pub fn database(
        code: impl Into<String>,
        table: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Database {
            code: code.into(),
            table: table.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Unavailable` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Returns `true` if this error was caused by caller input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::InvalidQuery { .. })
    }

    /// Returns `true` if the backend could not be reached.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// Diagnostic triple reported to the error log and echoed to clients.
    #[must_use]
    pub fn details(&self) -> ErrorDetails {
        match self {
            Self::Io { path, source } => ErrorDetails {
                code: io_error_code(source),
                path: Some(path.display().to_string()),
                message: source.to_string(),
            },
            Self::Database {
                code,
                table,
                message,
            } => ErrorDetails {
                code: code.clone(),
                path: Some(table.clone()),
                message: message.clone(),
            },
            Self::Validation { .. } => ErrorDetails {
                code: "VALIDATION".into(),
                path: None,
                message: self.to_string(),
            },
            Self::InvalidQuery { message } => ErrorDetails {
                code: "INVALID_QUERY".into(),
                path: None,
                message: message.clone(),
            },
            Self::Serialization { message } => ErrorDetails {
                code: "SERIALIZATION".into(),
                path: None,
                message: message.clone(),
            },
            Self::Unavailable { message } => ErrorDetails {
                code: "UNAVAILABLE".into(),
                path: None,
                message: message.clone(),
            },
        }
    }

    /// Display strings of this error and each of its sources, outermost first.
    #[must_use]
    pub fn chain(&self) -> Vec<String> {
        let mut chain = vec![self.to_string()];
        let mut current = self.source();
        while let Some(err) = current {
            chain.push(err.to_string());
            current = err.source();
        }
        chain
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization(e.to_string())
    }
}

/// Maps an I/O error to a stable code, preferring the OS errno name.
fn io_error_code(err: &std::io::Error) -> String {
    match err.raw_os_error() {
        Some(2) => "ENOENT".into(),
        Some(13) => "EACCES".into(),
        Some(17) => "EEXIST".into(),
        Some(20) => "ENOTDIR".into(),
        Some(21) => "EISDIR".into(),
        Some(28) => "ENOSPC".into(),
        Some(30) => "EROFS".into(),
        _ => format!("{:?}", err.kind()),
    }
}

/// Code, location and message describing a storage failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub path: Option<String>,
    pub message: String,
}
