//! Peak aggregation.
//!
//! Updates a channel's [`PeakRow`] from one sample. Each window (overall,
//! daily, weekly, monthly) is keyed; when the sample's key differs from the
//! stored key the window resets to the sample's value, otherwise the peak is
//! raised only on a strict increase. Callers must gate out the `-1` fetch
//! failure sentinel before calling.

use crate::database::models::PeakRow;
use crate::database::time::{day_key, month_key, week_start_key};

/// Apply one sample to the channel's peak record, producing the row to write.
pub fn apply_sample(existing: Option<PeakRow>, channel: &str, ts: i64, viewers: i64) -> PeakRow {
    debug_assert!(viewers >= 0, "fetch-failure sentinel must not reach peaks");

    let today = day_key(ts);
    let week_start = week_start_key(ts);
    let month = month_key(ts);

    let Some(mut row) = existing else {
        return PeakRow {
            channel: channel.to_string(),
            peak_overall: viewers,
            peak_overall_ts: Some(ts),
            peak_daily: viewers,
            peak_daily_date: Some(today),
            peak_weekly: viewers,
            peak_week_start: Some(week_start),
            peak_monthly: viewers,
            peak_month: Some(month),
        };
    };

    if viewers > row.peak_overall {
        row.peak_overall = viewers;
        row.peak_overall_ts = Some(ts);
    }

    if row.peak_daily_date.as_deref() != Some(today.as_str()) {
        row.peak_daily = viewers;
        row.peak_daily_date = Some(today);
    } else if viewers > row.peak_daily {
        row.peak_daily = viewers;
    }

    if row.peak_week_start.as_deref() != Some(week_start.as_str()) {
        row.peak_weekly = viewers;
        row.peak_week_start = Some(week_start);
    } else if viewers > row.peak_weekly {
        row.peak_weekly = viewers;
    }

    if row.peak_month.as_deref() != Some(month.as_str()) {
        row.peak_monthly = viewers;
        row.peak_month = Some(month);
    } else if viewers > row.peak_monthly {
        row.peak_monthly = viewers;
    }

    row
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-15 12:00:00 UTC, a Friday.
    const T0: i64 = 1_710_504_000;
    const DAY: i64 = 86_400;

    #[test]
    fn test_first_sample_seeds_all_windows() {
        let row = apply_sample(None, "xqc", T0, 50);
        assert_eq!(row.peak_overall, 50);
        assert_eq!(row.peak_overall_ts, Some(T0));
        assert_eq!(row.peak_daily, 50);
        assert_eq!(row.peak_daily_date.as_deref(), Some("2024-03-15"));
        assert_eq!(row.peak_weekly, 50);
        assert_eq!(row.peak_week_start.as_deref(), Some("2024-03-11"));
        assert_eq!(row.peak_monthly, 50);
        assert_eq!(row.peak_month.as_deref(), Some("2024-03"));
    }

    #[test]
    fn test_peak_raised_only_on_strict_increase() {
        let row = apply_sample(None, "xqc", T0, 50);
        let row = apply_sample(Some(row), "xqc", T0 + 60, 50);
        // Tie does not move the record timestamp.
        assert_eq!(row.peak_overall_ts, Some(T0));
        let row = apply_sample(Some(row), "xqc", T0 + 120, 80);
        assert_eq!(row.peak_overall, 80);
        assert_eq!(row.peak_overall_ts, Some(T0 + 120));
        assert_eq!(row.peak_daily, 80);
    }

    #[test]
    fn test_new_day_resets_daily_peak() {
        // (D1, 50), (D1, 30), (D2, 5) -> daily peak is 5, not max(50, 30, 5).
        let row = apply_sample(None, "xqc", T0, 50);
        let row = apply_sample(Some(row), "xqc", T0 + 60, 30);
        assert_eq!(row.peak_daily, 50);
        let row = apply_sample(Some(row), "xqc", T0 + DAY, 5);
        assert_eq!(row.peak_daily, 5);
        assert_eq!(row.peak_daily_date.as_deref(), Some("2024-03-16"));
        // Overall never resets.
        assert_eq!(row.peak_overall, 50);
    }

    #[test]
    fn test_windows_reset_independently() {
        // Friday -> next Monday crosses the day and week boundaries but stays
        // within March.
        let row = apply_sample(None, "xqc", T0, 100);
        let next_monday = T0 + 3 * DAY;
        let row = apply_sample(Some(row), "xqc", next_monday, 10);
        assert_eq!(row.peak_daily, 10);
        assert_eq!(row.peak_weekly, 10);
        assert_eq!(row.peak_week_start.as_deref(), Some("2024-03-18"));
        assert_eq!(row.peak_monthly, 100);
        assert_eq!(row.peak_overall, 100);
    }

    #[test]
    fn test_month_reset() {
        let row = apply_sample(None, "xqc", T0, 100);
        let in_april = T0 + 20 * DAY;
        let row = apply_sample(Some(row), "xqc", in_april, 3);
        assert_eq!(row.peak_month.as_deref(), Some("2024-04"));
        assert_eq!(row.peak_monthly, 3);
        assert_eq!(row.peak_overall, 100);
    }

    #[test]
    fn test_zero_viewers_is_a_valid_sample() {
        let row = apply_sample(None, "xqc", T0, 0);
        assert_eq!(row.peak_overall, 0);
        let row = apply_sample(Some(row), "xqc", T0 + DAY, 0);
        assert_eq!(row.peak_daily, 0);
        assert_eq!(row.peak_daily_date.as_deref(), Some("2024-03-16"));
    }
}
