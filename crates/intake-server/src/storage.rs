//! Record store selection.

use intake_storage::{DynRecordStore, StorageError};
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};

/// Open the backend named in configuration.
///
/// Neither backend fails on unavailable data: a missing or corrupt file
/// starts empty and an unreachable database runs degraded. The only error
/// is a PostgreSQL URL that cannot be parsed.
pub async fn build_store(cfg: &StorageConfig) -> Result<DynRecordStore, StorageError> {
    let store: DynRecordStore = match cfg.backend {
        StorageBackend::File => {
            info!(
                path = %cfg.file.path.display(),
                write_mode = ?cfg.file.write_mode,
                "Using JSON file record store"
            );
            intake_db_file::open_record_store(cfg.file.clone()).await
        }
        StorageBackend::Postgres => {
            info!(
                host = %cfg.postgres.host,
                database = %cfg.postgres.database,
                url_configured = cfg.postgres.url.is_some(),
                "Using PostgreSQL record store"
            );
            intake_db_postgres::create_record_store(cfg.postgres.to_backend_config()).await?
        }
    };
    Ok(store)
}
