//! Timestamp helpers for the database layer.
//!
//! Timestamps are stored as `INTEGER` unix epoch seconds (UTC). Peak window
//! keys are derived from the sample timestamp: calendar day (`YYYY-MM-DD`),
//! ISO week start (Monday, `YYYY-MM-DD`), and calendar month (`YYYY-MM`).

use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};

/// Current time as unix epoch seconds (UTC).
#[inline]
pub fn now_ts() -> i64 {
    Utc::now().timestamp()
}

fn utc_date(ts: i64) -> NaiveDate {
    Utc.timestamp_opt(ts, 0)
        .single()
        .unwrap_or_else(Utc::now)
        .date_naive()
}

/// Calendar day key for a timestamp (`YYYY-MM-DD`, UTC).
pub fn day_key(ts: i64) -> String {
    utc_date(ts).format("%Y-%m-%d").to_string()
}

/// ISO week start key for a timestamp: the Monday of that week (`YYYY-MM-DD`).
pub fn week_start_key(ts: i64) -> String {
    let date = utc_date(ts);
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    monday.format("%Y-%m-%d").to_string()
}

/// Calendar month key for a timestamp (`YYYY-MM`, UTC).
pub fn month_key(ts: i64) -> String {
    utc_date(ts).format("%Y-%m").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-15 12:00:00 UTC, a Friday.
    const FRIDAY_TS: i64 = 1_710_504_000;

    #[test]
    fn test_day_key() {
        assert_eq!(day_key(FRIDAY_TS), "2024-03-15");
    }

    #[test]
    fn test_month_key() {
        assert_eq!(month_key(FRIDAY_TS), "2024-03");
    }

    #[test]
    fn test_week_start_is_monday() {
        assert_eq!(week_start_key(FRIDAY_TS), "2024-03-11");
        // A Monday maps to itself.
        let monday_ts = FRIDAY_TS - 4 * 86_400;
        assert_eq!(day_key(monday_ts), "2024-03-11");
        assert_eq!(week_start_key(monday_ts), "2024-03-11");
    }

    #[test]
    fn test_week_key_crosses_month_boundary() {
        // 2024-04-01 is a Monday; the preceding Sunday belongs to March's week.
        let sunday_ts = 1_711_843_200; // 2024-03-31 00:00:00 UTC
        assert_eq!(week_start_key(sunday_ts), "2024-03-25");
    }
}
