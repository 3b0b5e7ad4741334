//! # Analytics Repository
//!
//! Dashboard counters and daily creation timelines.
//!
//! ## Dashboard
//! ```text
//!            ┌── COUNT(users) ──────────────────┐
//!            ├── COUNT(warehouses) ─────────────┤
//! try_join! ─┼── COUNT(warehouses WHERE active) ┼──► DashboardStats
//!            ├── COUNT(parcels) ────────────────┤
//!            ├── parcels GROUP BY status ───────┤
//!            └── retail_price of IN_STOCK ──────┘   (summed in Rust)
//! ```
//!
//! Every call queries the store; nothing is cached.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use gemstock_core::decimal::from_stored_opt;
use gemstock_core::summary::{
    daily_timeline, total_value, window_start, ParcelStats, StatusCount, UserStats,
    WarehouseStats,
};
use gemstock_core::{DashboardStats, ParcelStatus, TimelineKind, TimelinePoint};

use crate::error::{DbError, DbResult};

/// Repository for derived, read-only statistics.
#[derive(Debug, Clone)]
pub struct AnalyticsRepository {
    pool: SqlitePool,
}

impl AnalyticsRepository {
    /// Creates a new AnalyticsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AnalyticsRepository { pool }
    }

    /// Computes the dashboard counters.
    ///
    /// The sub-queries are issued concurrently. `totalValue` is the exact sum
    /// of retail prices over IN_STOCK parcels; parcels without a price add
    /// nothing. A sum past the decimal range is `InvalidInput`.
    pub async fn dashboard_stats(&self) -> DbResult<DashboardStats> {
        let users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users").fetch_one(&self.pool);
        let warehouses =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM warehouses").fetch_one(&self.pool);
        let active = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM warehouses WHERE is_active = 1",
        )
        .fetch_one(&self.pool);
        let parcels =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM parcels").fetch_one(&self.pool);
        let by_status = sqlx::query_as::<_, (ParcelStatus, i64)>(
            "SELECT status, COUNT(*) FROM parcels GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool);
        let prices = sqlx::query_as::<_, (String, Option<String>)>(
            "SELECT id, retail_price FROM parcels WHERE status = ?1",
        )
        .bind(ParcelStatus::InStock)
        .fetch_all(&self.pool);

        let (users, warehouses, active, parcels, by_status, prices) =
            tokio::try_join!(users, warehouses, active, parcels, by_status, prices)?;

        let prices = prices
            .into_iter()
            .map(|(id, price)| {
                from_stored_opt("retail_price", price.as_deref())
                    .map_err(|e| DbError::corrupt("Parcel", id, e))
            })
            .collect::<DbResult<Vec<_>>>()?;

        let stats = DashboardStats {
            users: UserStats { total: users },
            warehouses: WarehouseStats::new(warehouses, active),
            parcels: ParcelStats {
                total: parcels,
                by_status: by_status
                    .into_iter()
                    .map(|(status, count)| StatusCount { status, count })
                    .collect(),
                total_value: total_value(prices)?,
            },
        };

        debug!(
            users = stats.users.total,
            warehouses = stats.warehouses.total,
            parcels = stats.parcels.total,
            "Dashboard stats computed"
        );
        Ok(stats)
    }

    /// Daily creation counts for the window ending today (UTC).
    pub async fn timeline(&self, kind: TimelineKind) -> DbResult<Vec<TimelinePoint>> {
        self.timeline_on(kind, Utc::now().date_naive()).await
    }

    /// Daily creation counts from `today - 30 days` through `today`: exactly
    /// 31 ascending points, zero-filled.
    pub async fn timeline_on(
        &self,
        kind: TimelineKind,
        today: NaiveDate,
    ) -> DbResult<Vec<TimelinePoint>> {
        let table = match kind {
            TimelineKind::Parcels => "parcels",
            TimelineKind::Warehouses => "warehouses",
        };
        let start = window_start(today);

        // created_at is RFC 3339 text, so its first ten characters are the UTC date.
        let sql = format!(
            r#"
            SELECT substr(created_at, 1, 10) AS day, COUNT(*) AS count
            FROM {table}
            WHERE created_at >= ?1
            GROUP BY day
            "#
        );

        let rows: Vec<(String, i64)> = sqlx::query_as(&sql)
            .bind(start.format("%Y-%m-%d").to_string())
            .fetch_all(&self.pool)
            .await?;

        let counts = rows
            .into_iter()
            .map(|(day, count)| {
                NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                    .map(|date| (date, count))
                    .map_err(|e| DbError::corrupt(table, day.as_str(), e))
            })
            .collect::<DbResult<Vec<_>>>()?;

        debug!(kind = ?kind, start = %start, today = %today, days = counts.len(), "Timeline computed");
        Ok(daily_timeline(&counts, today))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
