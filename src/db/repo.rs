//! Repository layer for the SQLite command journal.

use crate::db::journal::{Journal, JournalError};
use crate::domain::{JournalEntry, Timestamp};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }
}

#[async_trait]
impl Journal for Repository {
    async fn append(
        &self,
        entry: &JournalEntry,
        recorded_at: Timestamp,
    ) -> Result<u64, JournalError> {
        let payload = serde_json::to_string(entry).map_err(JournalError::Encode)?;

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            INSERT INTO journal (kind, payload, recorded_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(entry.kind())
        .bind(payload)
        .bind(recorded_at.as_secs() as i64)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(result.last_insert_rowid() as u64)
    }

    async fn load(&self) -> Result<Vec<JournalEntry>, JournalError> {
        let rows = sqlx::query(
            r#"
            SELECT seq, payload
            FROM journal
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let seq: i64 = row.get("seq");
                let payload: String = row.get("payload");
                serde_json::from_str(&payload).map_err(|source| JournalError::Decode { seq, source })
            })
            .collect()
    }

    async fn entry_count(&self) -> Result<u64, JournalError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM journal")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }
}
