//! Schema bootstrap for the PostgreSQL storage backend.
//!
//! All records live in one table. `seq` fixes store order, `id` is the
//! database-generated identifier handed back to callers, and `record` holds
//! the patient document as JSONB.

use sqlx_postgres::PgPool;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::error::{PostgresError, Result};

/// Name of the record table.
pub const TABLE: &str = "patient_records";

/// Ensures the record table exists, once per process.
#[derive(Debug, Clone)]
pub struct SchemaManager {
    pool: PgPool,
    ready: std::sync::Arc<OnceCell<()>>,
}

impl SchemaManager {
    /// Creates a new `SchemaManager` with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            ready: std::sync::Arc::new(OnceCell::new()),
        }
    }

    /// Creates the record table if needed.
    ///
    /// Failures are not cached, so a later call retries after the database
    /// comes back.
    pub async fn ensure(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| self.create_table())
            .await
            .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn create_table(&self) -> Result<()> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{TABLE}" (
                seq BIGSERIAL PRIMARY KEY,
                id UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
                record JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#
        );

        sqlx_core::query::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        info!(table = TABLE, "Record table ready");
        debug!("Schema bootstrap complete");
        Ok(())
    }
}
