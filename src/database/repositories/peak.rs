//! Peak record repository.

use sqlx::SqlitePool;

use crate::Result;
use crate::database::models::PeakRow;
use crate::database::retry::retry_on_sqlite_busy;

pub struct PeakRepository {
    pool: SqlitePool,
}

impl PeakRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, channel: &str) -> Result<Option<PeakRow>> {
        let row = sqlx::query_as::<_, PeakRow>("SELECT * FROM peaks WHERE channel = ?")
            .bind(channel)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Write all four windows in one logical write.
    pub async fn upsert(&self, row: &PeakRow) -> Result<()> {
        retry_on_sqlite_busy("peak upsert", || async {
            sqlx::query(
                r#"
                INSERT INTO peaks (
                    channel, peak_overall, peak_overall_ts,
                    peak_daily, peak_daily_date,
                    peak_weekly, peak_week_start,
                    peak_monthly, peak_month
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(channel) DO UPDATE SET
                    peak_overall = excluded.peak_overall,
                    peak_overall_ts = excluded.peak_overall_ts,
                    peak_daily = excluded.peak_daily,
                    peak_daily_date = excluded.peak_daily_date,
                    peak_weekly = excluded.peak_weekly,
                    peak_week_start = excluded.peak_week_start,
                    peak_monthly = excluded.peak_monthly,
                    peak_month = excluded.peak_month
                "#,
            )
            .bind(&row.channel)
            .bind(row.peak_overall)
            .bind(row.peak_overall_ts)
            .bind(row.peak_daily)
            .bind(&row.peak_daily_date)
            .bind(row.peak_weekly)
            .bind(&row.peak_week_start)
            .bind(row.peak_monthly)
            .bind(&row.peak_month)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await
    }
}
