//! PostgreSQL implementation of the RecordStore trait.

use async_trait::async_trait;
use sqlx_postgres::PgPool;
use tracing::{info, warn};

use intake_storage::{NameQuery, PatientDraft, RecordStore, StorageError, StoredRecord};

use crate::config::PostgresConfig;
use crate::pool;
use crate::queries;
use crate::schema::SchemaManager;

/// PostgreSQL storage backend for patient records.
///
/// Holds no copy of the data: every search reflects the table at call time.
#[derive(Debug, Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
    schema: SchemaManager,
}

impl PostgresRecordStore {
    /// Creates a new `PostgresRecordStore` with the given configuration.
    ///
    /// An unreachable database does not fail construction: the problem is
    /// logged, a lazily-connecting pool is used instead, and operations
    /// return `StorageError::Unavailable` until the database is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error only if the connection URL is invalid.
    pub async fn connect(config: PostgresConfig) -> Result<Self, StorageError> {
        let pool = match pool::create_pool(&config).await {
            Ok(pool) => pool,
            Err(e) => {
                warn!(
                    url = %pool::mask_password(&config.url),
                    error = %e,
                    "PostgreSQL unreachable at startup, continuing in degraded mode"
                );
                // The table is ensured on first use once the database is back.
                return Ok(Self::from_pool(pool::create_lazy_pool(&config)?));
            }
        };

        let store = Self::from_pool(pool);
        match store.schema.ensure().await {
            Ok(()) => info!("PostgreSQL record store ready"),
            Err(e) => warn!(error = %e, "Record table not verified yet, will retry on first use"),
        }

        Ok(store)
    }

    /// Creates a new `PostgresRecordStore` from an existing connection pool.
    ///
    /// The table is created on first use.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        let schema = SchemaManager::new(pool.clone());
        Self { pool, schema }
    }

    async fn ready(&self) -> Result<(), StorageError> {
        self.schema.ensure().await.map_err(StorageError::from)
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn create(&self, draft: &PatientDraft) -> Result<StoredRecord, StorageError> {
        let record = draft.validate()?;
        self.ready().await?;
        queries::insert_record(&self.pool, record).await
    }

    async fn search(&self, name_part: &str) -> Result<Vec<StoredRecord>, StorageError> {
        let query = NameQuery::parse(name_part)?;
        self.ready().await?;
        queries::search_by_name(&self.pool, &query).await
    }

    async fn ping(&self) -> Result<(), StorageError> {
        pool::test_connection(&self.pool)
            .await
            .map_err(|e| StorageError::unavailable(e.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
