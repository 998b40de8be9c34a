//! Session repository.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::database::models::SessionRow;
use crate::database::retry::retry_on_sqlite_busy;
use crate::{Error, Result};

pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> Result<SessionRow> {
        sqlx::query_as::<_, SessionRow>("SELECT * FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("Session", id))
    }

    /// The currently open session for a channel, if any.
    ///
    /// Invariant: at most one session per channel has `end_ts IS NULL`; the
    /// `ORDER BY ... LIMIT 1` guards against historical violations.
    pub async fn open_session(&self, channel: &str) -> Result<Option<SessionRow>> {
        let session = sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM sessions WHERE channel = ? AND end_ts IS NULL ORDER BY start_ts DESC LIMIT 1",
        )
        .bind(channel)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    /// All currently open sessions, across channels.
    pub async fn list_open(&self) -> Result<Vec<SessionRow>> {
        let sessions = sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM sessions WHERE end_ts IS NULL ORDER BY start_ts",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    /// Sessions for one channel, newest first.
    pub async fn list_for_channel(&self, channel: &str, limit: i64) -> Result<Vec<SessionRow>> {
        let sessions = sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM sessions WHERE channel = ? ORDER BY start_ts DESC LIMIT ?",
        )
        .bind(channel)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    pub async fn create(&self, session: &SessionRow) -> Result<()> {
        retry_on_sqlite_busy("session create", || async {
            sqlx::query(
                r#"
                INSERT INTO sessions (id, channel, livestream_id, title, start_ts)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&session.id)
            .bind(&session.channel)
            .bind(&session.livestream_id)
            .bind(&session.title)
            .bind(session.start_ts)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await?;

        info!(
            channel = %session.channel,
            session = %session.id,
            livestream = %session.livestream_id,
            "Session opened"
        );
        Ok(())
    }

    /// Close a session: set its end time and compute the aggregate metrics
    /// from the samples carrying its id, in one statement.
    ///
    /// Metrics are computed exactly once: a session that is already closed is
    /// left untouched, so a second close (stale sweep racing a worker
    /// shutdown) neither moves `end_ts` nor recomputes the aggregates. A
    /// session closed with no samples ends up with `avg = 0, max = 0,
    /// count = 0`.
    pub async fn close(&self, id: &str, end_ts: i64) -> Result<()> {
        let changed = retry_on_sqlite_busy("session close", || async {
            let result = sqlx::query(
                r#"
                UPDATE sessions SET
                    end_ts = ?,
                    avg_viewers = COALESCE(
                        (SELECT AVG(viewers) FROM samples WHERE session_id = sessions.id), 0),
                    max_viewers = COALESCE(
                        (SELECT MAX(viewers) FROM samples WHERE session_id = sessions.id), 0),
                    sample_count =
                        (SELECT COUNT(*) FROM samples WHERE session_id = sessions.id)
                WHERE id = ? AND end_ts IS NULL
                "#,
            )
            .bind(end_ts)
            .bind(id)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected())
        })
        .await?;

        if changed > 0 {
            info!(session = %id, end_ts, "Session closed");
        } else {
            debug!(session = %id, "Session already closed; skipping");
        }
        Ok(())
    }
}
