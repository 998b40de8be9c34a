//! Channel registry repository.
//!
//! The registry is edited by an external management surface; the engine only
//! reads it. The ordered, duplicate-free list of slugs is the source of truth
//! the reconciler diffs against the supervisor's active worker set.

use sqlx::SqlitePool;

use crate::Result;

pub struct ChannelRepository {
    pool: SqlitePool,
}

impl ChannelRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List registered channel slugs, ordered by name.
    pub async fn list_channels(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM channels ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Insert a channel slug if not already present.
    ///
    /// Used by tests and bootstrap tooling; the running engine never mutates
    /// the registry.
    pub async fn add_channel(&self, name: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO channels (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove a channel slug.
    pub async fn remove_channel(&self, name: &str) -> Result<()> {
        sqlx::query("DELETE FROM channels WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
