//! # Aggregates
//!
//! Derived, read-only views over ledger state: per-warehouse stock summaries,
//! dashboard statistics and dense daily creation timelines.
//!
//! Nothing here is cached. The repositories load the raw rows and call these
//! functions on every request.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::decimal::checked_add;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{ParcelStatus, StoneUnit};
use crate::TIMELINE_WINDOW_DAYS;

// =============================================================================
// Stock Summary
// =============================================================================

/// The quantity columns of one parcel, as loaded for a stock summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StockEntry {
    pub status: ParcelStatus,
    pub unit: StoneUnit,
    pub available: Decimal,
    pub reserved: Decimal,
}

/// Per-unit totals inside a [`StockSummary`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UnitBucket {
    pub count: i64,
    #[ts(as = "String")]
    pub available: Decimal,
    #[ts(as = "String")]
    pub reserved: Decimal,
}

/// Aggregate of a warehouse's parcels.
///
/// ## Example Output
/// ```text
/// {
///   "totalParcels": 3,
///   "totalAvailable": "152.5",
///   "totalReserved": "30",
///   "byStatus": { "IN_STOCK": 2, "RESERVED": 1 },
///   "byUnit": { "CARAT": { "count": 2, "available": "150", "reserved": "30" },
///               "PIECE": { "count": 1, "available": "2.5", "reserved": "0" } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockSummary {
    pub total_parcels: i64,
    #[ts(as = "String")]
    pub total_available: Decimal,
    #[ts(as = "String")]
    pub total_reserved: Decimal,
    pub by_status: BTreeMap<ParcelStatus, i64>,
    pub by_unit: BTreeMap<StoneUnit, UnitBucket>,
}

impl StockSummary {
    /// Folds parcel quantities into a summary. Empty input yields zeros and
    /// empty maps.
    ///
    /// ## Errors
    /// `QuantityOverflow` when a total leaves the decimal range.
    pub fn compute<I>(entries: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = StockEntry>,
    {
        entries
            .into_iter()
            .try_fold(StockSummary::default(), |mut acc, entry| -> CoreResult<Self> {
                acc.total_parcels += 1;
                acc.total_available =
                    checked_add("totalAvailable", acc.total_available, entry.available)?;
                acc.total_reserved =
                    checked_add("totalReserved", acc.total_reserved, entry.reserved)?;
                *acc.by_status.entry(entry.status).or_insert(0) += 1;

                let bucket = acc.by_unit.entry(entry.unit).or_default();
                bucket.count += 1;
                bucket.available = checked_add("byUnit.available", bucket.available, entry.available)?;
                bucket.reserved = checked_add("byUnit.reserved", bucket.reserved, entry.reserved)?;
                Ok(acc)
            })
    }
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserStats {
    pub total: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WarehouseStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
}

impl WarehouseStats {
    pub fn new(total: i64, active: i64) -> Self {
        Self {
            total,
            active,
            inactive: total - active,
        }
    }
}

/// One slice of the parcel status distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StatusCount {
    pub status: ParcelStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ParcelStats {
    pub total: i64,
    /// Only statuses that occur; empty on an empty store.
    pub by_status: Vec<StatusCount>,
    /// Sum of retail prices over IN_STOCK parcels.
    #[ts(as = "String")]
    pub total_value: Decimal,
}

/// Dashboard counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    pub users: UserStats,
    pub warehouses: WarehouseStats,
    pub parcels: ParcelStats,
}

/// Sums optional prices, skipping missing ones. No values sums to zero.
pub fn total_value<I>(prices: I) -> CoreResult<Decimal>
where
    I: IntoIterator<Item = Option<Decimal>>,
{
    prices
        .into_iter()
        .flatten()
        .try_fold(Decimal::ZERO, |acc, price| checked_add("totalValue", acc, price))
}

// =============================================================================
// Timeline
// =============================================================================

/// Which records a timeline counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TimelineKind {
    Parcels,
    Warehouses,
}

impl std::str::FromStr for TimelineKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parcels" => Ok(TimelineKind::Parcels),
            "warehouses" => Ok(TimelineKind::Warehouses),
            other => Err(ValidationError::InvalidFormat {
                field: "kind".to_string(),
                reason: format!("unknown timeline '{}', expected parcels or warehouses", other),
            }
            .into()),
        }
    }
}

/// Number of records created on one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TimelinePoint {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub count: i64,
}

/// First day of the timeline window ending at `today`.
pub fn window_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(TIMELINE_WINDOW_DAYS)
}

/// Expands sparse per-day counts into one point per day of the window.
///
/// ```text
/// counts: [(06-03, 2), (06-05, 1)]     today: 07-03
/// output: 06-03:2, 06-04:0, 06-05:1, 06-06:0, ... 07-03:0   (31 points)
/// ```
///
/// Days outside the window are ignored; duplicate days are added together.
pub fn daily_timeline(counts: &[(NaiveDate, i64)], today: NaiveDate) -> Vec<TimelinePoint> {
    let start = window_start(today);

    let mut by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for &(day, count) in counts {
        if day >= start && day <= today {
            *by_day.entry(day).or_insert(0) += count;
        }
    }

    start
        .iter_days()
        .take_while(|day| *day <= today)
        .map(|date| TimelinePoint {
            date,
            count: by_day.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(status: ParcelStatus, unit: StoneUnit, available: &str, reserved: &str) -> StockEntry {
        StockEntry {
            status,
            unit,
            available: available.parse().unwrap(),
            reserved: reserved.parse().unwrap(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_stock_summary() {
        let summary = StockSummary::compute(Vec::new()).unwrap();
        assert_eq!(summary.total_parcels, 0);
        assert_eq!(summary.total_available, Decimal::ZERO);
        assert_eq!(summary.total_reserved, Decimal::ZERO);
        assert!(summary.by_status.is_empty());
        assert!(summary.by_unit.is_empty());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["byStatus"], serde_json::json!({}));
        assert_eq!(json["totalAvailable"], serde_json::json!("0"));
    }

    #[test]
    fn test_stock_summary_groups() {
        let summary = StockSummary::compute(vec![
            entry(ParcelStatus::InStock, StoneUnit::Carat, "100", "0"),
            entry(ParcelStatus::Reserved, StoneUnit::Carat, "50", "30"),
            entry(ParcelStatus::InStock, StoneUnit::Piece, "2.5", "0"),
        ])
        .unwrap();

        assert_eq!(summary.total_parcels, 3);
        assert_eq!(summary.total_available, "152.5".parse::<Decimal>().unwrap());
        assert_eq!(summary.total_reserved, Decimal::new(30, 0));
        assert_eq!(summary.by_status[&ParcelStatus::InStock], 2);
        assert_eq!(summary.by_status[&ParcelStatus::Reserved], 1);

        let carat = &summary.by_unit[&StoneUnit::Carat];
        assert_eq!(carat.count, 2);
        assert_eq!(carat.available, Decimal::new(150, 0));
        assert_eq!(carat.reserved, Decimal::new(30, 0));
        assert!(!summary.by_unit.contains_key(&StoneUnit::Gram));
    }

    #[test]
    fn test_stock_summary_serializes_enum_keys() {
        let summary =
            StockSummary::compute(vec![entry(ParcelStatus::OnMemo, StoneUnit::Gram, "1", "0")])
                .unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["byStatus"]["ON_MEMO"], 1);
        assert_eq!(json["byUnit"]["GRAM"]["count"], 1);
    }

    #[test]
    fn test_warehouse_stats_inactive() {
        assert_eq!(WarehouseStats::new(5, 3).inactive, 2);
    }

    #[test]
    fn test_stock_summary_overflow_is_an_error() {
        let mut full = entry(ParcelStatus::InStock, StoneUnit::Carat, "0", "0");
        full.available = Decimal::MAX;

        let err = StockSummary::compute(vec![full, full]).unwrap_err();
        assert!(matches!(err, CoreError::QuantityOverflow { ref field } if field == "totalAvailable"));

        let single = StockSummary::compute(vec![full]).unwrap();
        assert_eq!(single.total_available, Decimal::MAX);
    }

    #[test]
    fn test_total_value_overflow_is_an_error() {
        let prices = vec![Some(Decimal::MAX), None, Some(Decimal::ONE)];
        assert!(matches!(
            total_value(prices),
            Err(CoreError::QuantityOverflow { .. })
        ));
    }

    #[test]
    fn test_total_value_skips_missing() {
        let prices = vec![Some(Decimal::new(1050, 2)), None, Some(Decimal::new(200, 2))];
        assert_eq!(total_value(prices).unwrap(), Decimal::new(1250, 2));
        assert_eq!(total_value(Vec::new()).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_timeline_has_31_consecutive_days() {
        let today = date(2024, 3, 1);
        let points = daily_timeline(&[], today);

        assert_eq!(points.len(), 31);
        assert_eq!(points[0].date, date(2024, 1, 31));
        assert_eq!(points[30].date, today);
        for pair in points.windows(2) {
            assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
        }
        assert!(points.iter().all(|p| p.count == 0));
    }

    #[test]
    fn test_timeline_fills_counts() {
        let today = date(2024, 7, 3);
        let counts = vec![
            (date(2024, 6, 3), 2),
            (date(2024, 6, 5), 1),
            (date(2024, 6, 5), 4),
            (date(2024, 7, 3), 3),
            (date(2024, 6, 2), 9),
        ];
        let points = daily_timeline(&counts, today);

        assert_eq!(points.len(), 31);
        assert_eq!(points[0], TimelinePoint { date: date(2024, 6, 3), count: 2 });
        assert_eq!(points[2].count, 5);
        assert_eq!(points[30].count, 3);
        assert_eq!(points.iter().map(|p| p.count).sum::<i64>(), 10);
    }

    #[test]
    fn test_timeline_kind_parse() {
        assert_eq!("Parcels".parse::<TimelineKind>().unwrap(), TimelineKind::Parcels);
        assert!("stones".parse::<TimelineKind>().is_err());
    }
}
