//! Session database model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One contiguous broadcast, inferred from consecutive live polls sharing a
/// livestream identifier.
///
/// `end_ts = NULL` means the session is still open. Aggregate metrics
/// (`avg_viewers`, `max_viewers`, `sample_count`) are computed once, at close
/// time, from the samples carrying this session's id.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SessionRow {
    pub id: String,
    pub channel: String,
    pub livestream_id: String,
    pub title: Option<String>,
    /// Unix epoch seconds (UTC).
    pub start_ts: i64,
    pub end_ts: Option<i64>,
    pub avg_viewers: Option<f64>,
    pub max_viewers: Option<i64>,
    pub sample_count: Option<i64>,
}

impl SessionRow {
    pub fn new(
        channel: impl Into<String>,
        livestream_id: impl Into<String>,
        title: Option<String>,
        start_ts: i64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            channel: channel.into(),
            livestream_id: livestream_id.into(),
            title,
            start_ts,
            end_ts: None,
            avg_viewers: None,
            max_viewers: None,
            sample_count: None,
        }
    }

    /// Whether the session is still open.
    pub fn is_open(&self) -> bool {
        self.end_ts.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_new_is_open() {
        let session = SessionRow::new("xqc", "ls-1", Some("title".into()), 1_700_000_000);
        assert!(session.is_open());
        assert!(session.avg_viewers.is_none());
        assert_ne!(
            SessionRow::new("xqc", "ls-1", None, 0).id,
            SessionRow::new("xqc", "ls-1", None, 0).id
        );
    }
}
