//! Error types for the PostgreSQL storage backend.

use intake_storage::StorageError;
use sqlx_core::error::Error as SqlxError;

/// Errors specific to the PostgreSQL storage backend.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(#[from] SqlxError),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PostgresError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<PostgresError> for StorageError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Connection(e) => into_storage_error(e, crate::schema::TABLE),
            PostgresError::Config { message } => {
                StorageError::unavailable(format!("Configuration error: {message}"))
            }
        }
    }
}

/// Returns true if the error means the server could not be reached at all.
pub fn is_connectivity_error(err: &SqlxError) -> bool {
    matches!(
        err,
        SqlxError::Io(_)
            | SqlxError::Tls(_)
            | SqlxError::PoolTimedOut
            | SqlxError::PoolClosed
            | SqlxError::WorkerCrashed
    )
}

/// Translates a sqlx error raised while working on `table`.
pub fn into_storage_error(err: SqlxError, table: &str) -> StorageError {
    if is_connectivity_error(&err) {
        return StorageError::unavailable(err.to_string());
    }

    match err {
        SqlxError::Database(db_err) => {
            let code = db_err
                .code()
                .map(|c| c.into_owned())
                .unwrap_or_else(|| "UNKNOWN".to_string());
            StorageError::database(code, table, db_err.message())
        }
        other => StorageError::database("INTERNAL", table, other.to_string()),
    }
}

/// Result type alias for PostgreSQL operations.
pub type Result<T> = std::result::Result<T, PostgresError>;
