//! Sample database model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One timestamped viewer-count observation for a channel.
///
/// `viewers = -1` is a sentinel meaning the fetch failed, not zero viewers.
/// `session_id` is set only while a session is open for the channel.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SampleRow {
    pub id: i64,
    pub channel: String,
    /// Unix epoch seconds (UTC).
    pub ts: i64,
    pub viewers: i64,
    pub is_live: bool,
    /// Raw platform payload, serialized JSON, kept for audit/debug.
    pub raw_json: Option<String>,
    pub session_id: Option<String>,
}

impl SampleRow {
    pub fn new(
        channel: impl Into<String>,
        ts: i64,
        viewers: i64,
        is_live: bool,
        raw_json: Option<String>,
        session_id: Option<String>,
    ) -> Self {
        Self {
            id: 0,
            channel: channel.into(),
            ts,
            viewers,
            is_live,
            raw_json,
            session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_new() {
        let sample = SampleRow::new("xqc", 1_700_000_000, 1234, true, None, None);
        assert_eq!(sample.channel, "xqc");
        assert_eq!(sample.viewers, 1234);
        assert!(sample.session_id.is_none());
    }
}
