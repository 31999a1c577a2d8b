//! Insert and name search statements for patient records.

use sqlx_core::query_as::query_as;
use sqlx_core::types::Json;
use sqlx_postgres::PgPool;
use uuid::Uuid;

use intake_storage::{NameQuery, PatientRecord, RecordId, StorageError, StoredRecord};

use crate::error::into_storage_error;
use crate::schema::TABLE;

/// Inserts one record and returns it with the generated id.
pub async fn insert_record(
    pool: &PgPool,
    record: PatientRecord,
) -> Result<StoredRecord, StorageError> {
    let sql = format!(r#"INSERT INTO "{TABLE}" (record) VALUES ($1) RETURNING id"#);

    let (id,): (Uuid,) = query_as(&sql)
        .bind(Json(&record))
        .fetch_one(pool)
        .await
        .map_err(|e| into_storage_error(e, TABLE))?;

    Ok(StoredRecord::new(RecordId::Generated(id), record))
}

/// Returns records whose first or last name contains the query, ignoring
/// case, ordered by insertion.
pub async fn search_by_name(
    pool: &PgPool,
    query: &NameQuery,
) -> Result<Vec<StoredRecord>, StorageError> {
    let sql = format!(
        r#"SELECT id, record
           FROM "{TABLE}"
           WHERE record->>'firstName' ILIKE $1 ESCAPE '\'
              OR record->>'lastName' ILIKE $1 ESCAPE '\'
           ORDER BY seq"#
    );
    let pattern = format!("%{}%", escape_like(query.as_str()));

    let rows: Vec<(Uuid, Json<PatientRecord>)> = query_as(&sql)
        .bind(pattern)
        .fetch_all(pool)
        .await
        .map_err(|e| into_storage_error(e, TABLE))?;

    Ok(rows
        .into_iter()
        .map(|(id, Json(record))| StoredRecord::new(RecordId::Generated(id), record))
        .collect())
}

/// Escapes `LIKE` metacharacters so the input matches literally.
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("lee"), "lee");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
