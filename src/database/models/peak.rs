//! Peak record database model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Rolling viewer-count maxima for one channel.
///
/// Four independent windows: overall (all time), daily (UTC calendar day),
/// weekly (ISO week, Monday start), and monthly (calendar month). Each
/// windowed peak is paired with the key that last reset it; when a sample's
/// key differs, the peak resets to that sample's value instead of keeping
/// the old maximum.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PeakRow {
    pub channel: String,
    pub peak_overall: i64,
    /// Timestamp of the overall record value (unix epoch seconds).
    pub peak_overall_ts: Option<i64>,
    pub peak_daily: i64,
    pub peak_daily_date: Option<String>,
    pub peak_weekly: i64,
    pub peak_week_start: Option<String>,
    pub peak_monthly: i64,
    pub peak_month: Option<String>,
}
