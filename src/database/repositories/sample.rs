//! Sample repository.

use sqlx::SqlitePool;

use crate::Result;
use crate::database::models::SampleRow;
use crate::database::retry::retry_on_sqlite_busy;

pub struct SampleRepository {
    pool: SqlitePool,
}

impl SampleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a sample including the raw payload.
    pub async fn insert(&self, sample: &SampleRow) -> Result<()> {
        retry_on_sqlite_busy("sample insert", || async {
            sqlx::query(
                r#"
                INSERT INTO samples (channel, ts, viewers, is_live, raw_json, session_id)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&sample.channel)
            .bind(sample.ts)
            .bind(sample.viewers)
            .bind(sample.is_live)
            .bind(&sample.raw_json)
            .bind(&sample.session_id)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await
    }

    /// Insert a sample without the raw payload.
    ///
    /// Fallback for when the primary insert fails (e.g. an oversized or
    /// unstorable payload); the structured fields are still worth keeping.
    pub async fn insert_slim(&self, sample: &SampleRow) -> Result<()> {
        retry_on_sqlite_busy("sample insert (slim)", || async {
            sqlx::query(
                r#"
                INSERT INTO samples (channel, ts, viewers, is_live, session_id)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&sample.channel)
            .bind(sample.ts)
            .bind(sample.viewers)
            .bind(sample.is_live)
            .bind(&sample.session_id)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await
    }

    /// Timestamp of the most recent sample carrying the given session id.
    pub async fn last_sample_ts(&self, session_id: &str) -> Result<Option<i64>> {
        let row: (Option<i64>,) =
            sqlx::query_as("SELECT MAX(ts) FROM samples WHERE session_id = ?")
                .bind(session_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    /// Samples for one session, ordered by timestamp.
    pub async fn list_for_session(&self, session_id: &str) -> Result<Vec<SampleRow>> {
        let samples = sqlx::query_as::<_, SampleRow>(
            "SELECT * FROM samples WHERE session_id = ? ORDER BY ts",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(samples)
    }

    /// Samples for one channel, newest first.
    pub async fn list_for_channel(&self, channel: &str, limit: i64) -> Result<Vec<SampleRow>> {
        let samples = sqlx::query_as::<_, SampleRow>(
            "SELECT * FROM samples WHERE channel = ? ORDER BY ts DESC LIMIT ?",
        )
        .bind(channel)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(samples)
    }
}
