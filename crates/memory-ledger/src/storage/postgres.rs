//! PostgreSQL storage implementation

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use super::traits::RecordStore;
use crate::error::{StorageError, StorageResult};
use crate::record::MemoryRecord;

/// PostgreSQL-backed record store
#[derive(Debug, Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Connect to PostgreSQL and initialize schema
    pub async fn new(
        url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> StorageResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS memory_records (
                id UUID PRIMARY KEY,
                created_at TIMESTAMPTZ NOT NULL,
                stage TEXT NOT NULL,
                cycle_index BIGINT NOT NULL,
                data JSONB NOT NULL
            );
            "#,
            r#"CREATE INDEX IF NOT EXISTS memory_records_created_at ON memory_records(created_at DESC);"#,
        ];

        for stmt in statements {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Query(e.to_string()))?;
        }

        Ok(())
    }

    fn to_json(record: &MemoryRecord) -> StorageResult<Value> {
        serde_json::to_value(record)
            .map_err(|e| StorageError::Serialization(format!("json serialize error: {}", e)))
    }

    fn from_json(value: Value) -> StorageResult<MemoryRecord> {
        serde_json::from_value(value)
            .map_err(|e| StorageError::Serialization(format!("json deserialize error: {}", e)))
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn insert_record(&self, record: &MemoryRecord) -> StorageResult<()> {
        let data = Self::to_json(record)?;
        sqlx::query(
            r#"
            INSERT INTO memory_records (id, created_at, stage, cycle_index, data)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id.0)
        .bind(record.created_at)
        .bind(&record.stage)
        .bind(to_bigint(record.cycle_index))
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;
        Ok(())
    }

    async fn count_records(&self) -> StorageResult<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM memory_records")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;
        let total: i64 = row
            .try_get("total")
            .map_err(|e| StorageError::Query(e.to_string()))?;
        Ok(usize::try_from(total).unwrap_or(0))
    }

    async fn list_recent(&self, limit: usize) -> StorageResult<Vec<MemoryRecord>> {
        let rows = sqlx::query("SELECT data FROM memory_records ORDER BY created_at DESC LIMIT $1")
            .bind(to_bigint(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;

        let mut records: Vec<MemoryRecord> = rows
            .into_iter()
            .map(|row| {
                let data: Value = row
                    .try_get("data")
                    .map_err(|e| StorageError::Query(e.to_string()))?;
                Self::from_json(data)
            })
            .collect::<Result<_, _>>()?;
        records.reverse();
        Ok(records)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

/// BIGINT columns are signed; values past `i64::MAX` saturate.
fn to_bigint<T: TryInto<i64>>(value: T) -> i64 {
    value.try_into().unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_bigint_saturates() {
        assert_eq!(to_bigint(42u64), 42);
        assert_eq!(to_bigint(u64::MAX), i64::MAX);
        assert_eq!(to_bigint(i64::MAX as u64 + 1), i64::MAX);
        assert_eq!(to_bigint(usize::MAX), i64::MAX);
    }
}
