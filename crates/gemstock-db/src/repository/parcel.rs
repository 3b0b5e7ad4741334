//! # Parcel Repository
//!
//! The quantity ledger: parcels, their joined views and their append-only
//! transaction history.
//!
//! ## Update Flow
//! ```text
//! BEGIN
//!   UPDATE parcels SET updated_at = now WHERE id = ?   ← NotFound if 0 rows,
//!   SELECT parcel                                        takes the write lock
//!   ledger::apply_parcel_patch(parcel, patch)
//!   UPDATE parcels SET ... WHERE id = ?                  ← NotFound if 0 rows
//!   SELECT view (joins + AVAILABLE stone preview)
//! COMMIT
//! ```
//!
//! ## Quantity Rule
//! `available + reserved <= totalQuantity` is enforced on create, and on update
//! only when all three quantities are supplied together.

use chrono::Utc;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use gemstock_core::input::{CreateParcelInput, ParcelFilter, RecordTransactionInput, UpdateParcelInput};
use gemstock_core::ledger::apply_parcel_patch;
use gemstock_core::{
    CoreError, Parcel, ParcelDetail, ParcelListing, ParcelTransaction, ParcelView, Stone,
    StoneProfile, StoneStatus, StoneSummary, TrackingMode, AVAILABLE_STONE_PREVIEW_LIMIT,
    RECENT_TRANSACTION_LIMIT,
};

use super::rows::{
    convert_all, dec, new_id, opt_dec, ParcelJoin, ParcelRow, StoneProfileRow, StoneRow,
    TransactionRow, PARCEL_COLUMNS, PARCEL_JOINS, PARCEL_JOIN_COLUMNS, STONE_COLUMNS,
    STONE_PROFILE_COLUMNS,
};
use super::warehouse::warehouse_exists;
use crate::error::{DbError, DbResult};

#[derive(Debug, FromRow)]
struct ParcelJoinedRow {
    #[sqlx(flatten)]
    parcel: ParcelRow,
    #[sqlx(flatten)]
    join: ParcelJoin,
}

#[derive(Debug, FromRow)]
struct ParcelListingRow {
    #[sqlx(flatten)]
    parcel: ParcelRow,
    #[sqlx(flatten)]
    join: ParcelJoin,
    stone_count: i64,
}

impl TryFrom<ParcelListingRow> for ParcelListing {
    type Error = DbError;

    fn try_from(row: ParcelListingRow) -> DbResult<Self> {
        let parcel = Parcel::try_from(row.parcel)?;
        let joined = row.join.into_summaries(&parcel);
        Ok(ParcelListing {
            parcel,
            warehouse: joined.warehouse,
            variant: joined.variant,
            stone_profile: joined.stone_profile,
            stone_count: row.stone_count,
        })
    }
}

/// Repository for parcel operations.
#[derive(Debug, Clone)]
pub struct ParcelRepository {
    pool: SqlitePool,
}

impl ParcelRepository {
    /// Creates a new ParcelRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ParcelRepository { pool }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Creates a parcel in an existing warehouse.
    ///
    /// ## Errors
    /// - `InvalidInput` for malformed or negative quantities, or when
    ///   `available + reserved > totalQuantity`
    /// - `NotFound` if the warehouse doesn't exist
    pub async fn create(&self, input: CreateParcelInput) -> DbResult<ParcelView> {
        let new = input.validate()?;
        let id = new_id();
        let now = Utc::now();
        let received_at = new.received_at.unwrap_or(now);

        debug!(
            id = %id,
            warehouse_id = %new.warehouse_id,
            mode = %new.tracking_mode,
            unit = %new.unit,
            total = %new.total_quantity,
            "Creating parcel"
        );

        let mut tx = self.pool.begin().await?;

        if !warehouse_exists(&mut tx, &new.warehouse_id).await? {
            return Err(DbError::not_found("Warehouse", &new.warehouse_id));
        }

        sqlx::query(
            r#"
            INSERT INTO parcels (
                id, warehouse_id, shop_id, variant_id, parcel_code, supplier_ref,
                tracking_mode, stone_type, stone_profile_id, origin, quality_grade,
                certification, parcel_report_ref, unit, total_quantity, available,
                reserved, min_order_qty, cost_price, wholesale_price, retail_price,
                status, sellable, notes, received_at, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20, ?21,
                ?22, ?23, ?24, ?25, ?26, ?26
            )
            "#,
        )
        .bind(&id)
        .bind(&new.warehouse_id)
        .bind(&new.shop_id)
        .bind(&new.variant_id)
        .bind(&new.parcel_code)
        .bind(&new.supplier_ref)
        .bind(new.tracking_mode)
        .bind(new.stone_type)
        .bind(&new.stone_profile_id)
        .bind(&new.origin)
        .bind(&new.quality_grade)
        .bind(&new.certification)
        .bind(&new.parcel_report_ref)
        .bind(new.unit)
        .bind(dec(new.total_quantity))
        .bind(dec(new.available))
        .bind(dec(new.reserved))
        .bind(opt_dec(new.min_order_qty))
        .bind(opt_dec(new.cost_price))
        .bind(opt_dec(new.wholesale_price))
        .bind(opt_dec(new.retail_price))
        .bind(new.status)
        .bind(new.sellable)
        .bind(&new.notes)
        .bind(received_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let view = load_view(&mut tx, &id).await?;
        tx.commit().await?;

        info!(id = %id, code = %view.parcel.parcel_code, "Parcel created");
        Ok(view)
    }

    /// Applies a partial update.
    ///
    /// Null on an optional field clears it; null on `variantId` or
    /// `stoneProfileId` disconnects the relation. Moving the parcel to a
    /// warehouse that doesn't exist fails with `NotFound`. A SINGLE parcel that
    /// still has stones cannot be switched to BULK.
    pub async fn update(&self, id: &str, input: UpdateParcelInput) -> DbResult<ParcelView> {
        let patch = input.validate()?;
        let now = Utc::now();

        debug!(id = %id, "Updating parcel");

        let mut tx = self.pool.begin().await?;
        touch(&mut tx, id, now).await?;

        let mut parcel = fetch_parcel(&mut tx, id).await?;

        if let Some(target) = patch.warehouse_id.as_deref() {
            if target != parcel.warehouse_id && !warehouse_exists(&mut tx, target).await? {
                return Err(DbError::not_found("Warehouse", target));
            }
        }

        if parcel.tracking_mode == TrackingMode::Single
            && patch.tracking_mode == Some(TrackingMode::Bulk)
        {
            let stones: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stones WHERE parcel_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
            if stones > 0 {
                return Err(CoreError::TrackingModeMismatch {
                    parcel_id: id.to_string(),
                    mode: TrackingMode::Bulk,
                }
                .into());
            }
        }

        apply_parcel_patch(&mut parcel, patch, now);

        let result = sqlx::query(
            r#"
            UPDATE parcels SET
                warehouse_id = ?2, shop_id = ?3, variant_id = ?4, parcel_code = ?5,
                supplier_ref = ?6, tracking_mode = ?7, stone_type = ?8,
                stone_profile_id = ?9, origin = ?10, quality_grade = ?11,
                certification = ?12, parcel_report_ref = ?13, unit = ?14,
                total_quantity = ?15, available = ?16, reserved = ?17,
                min_order_qty = ?18, cost_price = ?19, wholesale_price = ?20,
                retail_price = ?21, status = ?22, sellable = ?23, notes = ?24,
                received_at = ?25, updated_at = ?26
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&parcel.warehouse_id)
        .bind(&parcel.shop_id)
        .bind(&parcel.variant_id)
        .bind(&parcel.parcel_code)
        .bind(&parcel.supplier_ref)
        .bind(parcel.tracking_mode)
        .bind(parcel.stone_type)
        .bind(&parcel.stone_profile_id)
        .bind(&parcel.origin)
        .bind(&parcel.quality_grade)
        .bind(&parcel.certification)
        .bind(&parcel.parcel_report_ref)
        .bind(parcel.unit)
        .bind(dec(parcel.total_quantity))
        .bind(dec(parcel.available))
        .bind(dec(parcel.reserved))
        .bind(opt_dec(parcel.min_order_qty))
        .bind(opt_dec(parcel.cost_price))
        .bind(opt_dec(parcel.wholesale_price))
        .bind(opt_dec(parcel.retail_price))
        .bind(parcel.status)
        .bind(parcel.sellable)
        .bind(&parcel.notes)
        .bind(parcel.received_at)
        .bind(parcel.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Parcel", id));
        }

        let view = load_view(&mut tx, id).await?;
        tx.commit().await?;

        if !view.parcel.is_consistent() {
            debug!(
                id = %id,
                total = %view.parcel.total_quantity,
                available = %view.parcel.available,
                reserved = %view.parcel.reserved,
                "Parcel quantities exceed total after partial update"
            );
        }

        Ok(view)
    }

    /// Deletes a parcel. Its stones and transactions go with it.
    pub async fn remove(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Removing parcel");

        let result = sqlx::query("DELETE FROM parcels WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Parcel", id));
        }

        info!(id = %id, "Parcel deleted");
        Ok(())
    }

    /// Appends an entry to the parcel's history.
    ///
    /// The parcel's quantities are left as they are.
    pub async fn record_transaction(
        &self,
        parcel_id: &str,
        input: RecordTransactionInput,
    ) -> DbResult<ParcelTransaction> {
        let new = input.validate()?;
        let entry = ParcelTransaction {
            id: new_id(),
            parcel_id: parcel_id.to_string(),
            kind: new.kind,
            quantity: new.quantity,
            reference: new.reference,
            notes: new.notes,
            created_at: Utc::now(),
        };

        let mut conn = self.pool.acquire().await?;
        if !parcel_exists(&mut conn, parcel_id).await? {
            return Err(DbError::not_found("Parcel", parcel_id));
        }

        sqlx::query(
            r#"
            INSERT INTO parcel_transactions (id, parcel_id, kind, quantity, reference, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.parcel_id)
        .bind(entry.kind)
        .bind(dec(entry.quantity))
        .bind(&entry.reference)
        .bind(&entry.notes)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        debug!(parcel_id = %parcel_id, kind = %entry.kind, quantity = %entry.quantity, "Transaction recorded");
        Ok(entry)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Lists parcels matching every provided filter, most recently received
    /// first.
    pub async fn find_all(&self, filter: &ParcelFilter) -> DbResult<Vec<ParcelListing>> {
        debug!(?filter, "Listing parcels");

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            r#"
            SELECT {PARCEL_COLUMNS}, {PARCEL_JOIN_COLUMNS},
                   (SELECT COUNT(*) FROM stones st WHERE st.parcel_id = p.id) AS stone_count
            FROM parcels p
            {PARCEL_JOINS}
            WHERE 1 = 1
            "#
        ));

        if let Some(shop_id) = &filter.shop_id {
            query.push(" AND p.shop_id = ").push_bind(shop_id.clone());
        }
        if let Some(warehouse_id) = &filter.warehouse_id {
            query.push(" AND p.warehouse_id = ").push_bind(warehouse_id.clone());
        }
        if let Some(status) = filter.status {
            query.push(" AND p.status = ").push_bind(status);
        }
        if let Some(variant_id) = &filter.variant_id {
            query.push(" AND p.variant_id = ").push_bind(variant_id.clone());
        }
        if let Some(mode) = filter.tracking_mode {
            query.push(" AND p.tracking_mode = ").push_bind(mode);
        }
        if let Some(stone_type) = filter.stone_type {
            query.push(" AND p.stone_type = ").push_bind(stone_type);
        }

        query.push(" ORDER BY p.received_at DESC, p.created_at DESC");

        let rows: Vec<ParcelListingRow> = query.build_query_as().fetch_all(&self.pool).await?;

        debug!(count = rows.len(), "Parcels listed");
        convert_all(rows)
    }

    /// Gets a parcel with all of its stones, recent history and full profile.
    pub async fn find_one(&self, id: &str) -> DbResult<ParcelDetail> {
        // One read transaction so the counts match the lists.
        let mut tx = self.pool.begin().await?;

        let row = fetch_joined(&mut tx, id).await?;
        let parcel = Parcel::try_from(row.parcel)?;
        let joined = row.join.into_summaries(&parcel);

        let stone_profile = match parcel.stone_profile_id.as_deref() {
            Some(profile_id) => {
                let sql = format!("SELECT {STONE_PROFILE_COLUMNS} FROM stone_profiles sp WHERE sp.id = ?1");
                let row: Option<StoneProfileRow> = sqlx::query_as(&sql)
                    .bind(profile_id)
                    .fetch_optional(&mut *tx)
                    .await?;
                row.map(StoneProfile::from)
            }
            None => None,
        };

        let sql = format!(
            "SELECT {STONE_COLUMNS} FROM stones st WHERE st.parcel_id = ?1 ORDER BY st.stone_code ASC"
        );
        let stones: Vec<StoneRow> = sqlx::query_as(&sql).bind(id).fetch_all(&mut *tx).await?;
        let stones: Vec<Stone> = convert_all(stones)?;

        let transactions = fetch_transactions(&mut tx, id, RECENT_TRANSACTION_LIMIT).await?;

        let transaction_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM parcel_transactions WHERE parcel_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(ParcelDetail {
            parcel,
            warehouse: joined.warehouse,
            variant: joined.variant,
            stone_profile,
            stone_count: stones.len() as i64,
            stones,
            transactions,
            transaction_count,
        })
    }

    /// Newest-first history of a parcel, at most `limit` entries.
    pub async fn recent_transactions(
        &self,
        parcel_id: &str,
        limit: i64,
    ) -> DbResult<Vec<ParcelTransaction>> {
        let mut conn = self.pool.acquire().await?;

        if !parcel_exists(&mut conn, parcel_id).await? {
            return Err(DbError::not_found("Parcel", parcel_id));
        }

        fetch_transactions(&mut conn, parcel_id, limit).await
    }
}

// =============================================================================
// Connection-level Helpers
// =============================================================================

async fn touch(conn: &mut SqliteConnection, id: &str, now: chrono::DateTime<Utc>) -> DbResult<()> {
    let result = sqlx::query("UPDATE parcels SET updated_at = ?2 WHERE id = ?1")
        .bind(id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Parcel", id));
    }
    Ok(())
}

pub(crate) async fn parcel_exists(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM parcels WHERE id = ?1)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

/// Loads a bare parcel record.
pub(crate) async fn fetch_parcel(conn: &mut SqliteConnection, id: &str) -> DbResult<Parcel> {
    let sql = format!("SELECT {PARCEL_COLUMNS} FROM parcels p WHERE p.id = ?1");
    let row: Option<ParcelRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.ok_or_else(|| DbError::not_found("Parcel", id))?
        .try_into()
}

async fn fetch_joined(conn: &mut SqliteConnection, id: &str) -> DbResult<ParcelJoinedRow> {
    let sql = format!(
        "SELECT {PARCEL_COLUMNS}, {PARCEL_JOIN_COLUMNS} FROM parcels p {PARCEL_JOINS} WHERE p.id = ?1"
    );
    let row: Option<ParcelJoinedRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.ok_or_else(|| DbError::not_found("Parcel", id))
}

/// The parcel with its summaries and a preview of its AVAILABLE stones.
async fn load_view(conn: &mut SqliteConnection, id: &str) -> DbResult<ParcelView> {
    let row = fetch_joined(conn, id).await?;
    let parcel = Parcel::try_from(row.parcel)?;
    let joined = row.join.into_summaries(&parcel);

    let sql = format!(
        r#"
        SELECT {STONE_COLUMNS} FROM stones st
        WHERE st.parcel_id = ?1 AND st.status = ?2
        ORDER BY st.stone_code ASC
        LIMIT ?3
        "#
    );
    let rows: Vec<StoneRow> = sqlx::query_as(&sql)
        .bind(id)
        .bind(StoneStatus::Available)
        .bind(AVAILABLE_STONE_PREVIEW_LIMIT)
        .fetch_all(&mut *conn)
        .await?;
    let stones: Vec<Stone> = convert_all(rows)?;

    Ok(ParcelView {
        parcel,
        warehouse: joined.warehouse,
        variant: joined.variant,
        stone_profile: joined.stone_profile,
        stones: stones.iter().map(StoneSummary::from).collect(),
    })
}

async fn fetch_transactions(
    conn: &mut SqliteConnection,
    parcel_id: &str,
    limit: i64,
) -> DbResult<Vec<ParcelTransaction>> {
    let rows: Vec<TransactionRow> = sqlx::query_as(
        r#"
        SELECT id, parcel_id, kind, quantity, reference, notes, created_at
        FROM parcel_transactions
        WHERE parcel_id = ?1
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?2
        "#,
    )
    .bind(parcel_id)
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;

    convert_all(rows)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{
        parcel_input, profile, setup, single_parcel, stone_fields, warehouse,
    };
    use chrono::{Duration, TimeZone};
    use gemstock_core::input::{CreateProductInput, CreateStoneInput, CreateVariantInput};
    use gemstock_core::{ParcelStatus, StoneUnit, TransactionKind};
    use rust_decimal::Decimal;
    use serde_json::json;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn tx_input(kind: TransactionKind, quantity: &str) -> RecordTransactionInput {
        RecordTransactionInput {
            kind,
            quantity: quantity.to_string(),
            reference: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let db = setup().await;
        let wh = warehouse(&db, "WH-1").await;

        let mut input = parcel_input(&wh, "100", "100");
        input.shop_id = Some("   ".into());
        input.retail_price = Some("2500.00".into());
        let view = db.parcels().create(input).await.unwrap();

        let p = &view.parcel;
        assert_eq!(p.tracking_mode, TrackingMode::Bulk);
        assert_eq!(p.status, ParcelStatus::InStock);
        assert!(!p.sellable);
        assert_eq!(p.shop_id, None);
        assert_eq!(p.reserved, Decimal::ZERO);
        assert_eq!(p.total_quantity, d("100"));
        assert_eq!(p.retail_price, Some(d("2500.00")));
        assert_eq!(p.received_at, p.created_at);

        assert_eq!(view.warehouse.id, wh);
        assert_eq!(view.warehouse.code, "WH-1");
        assert!(view.variant.is_none());
        assert!(view.stone_profile.is_none());
        assert!(view.stones.is_empty());
    }

    #[tokio::test]
    async fn test_create_keeps_exact_decimals() {
        let db = setup().await;
        let wh = warehouse(&db, "WH-1").await;

        let mut input = parcel_input(&wh, "0.30", "0.10");
        input.reserved = Some("0.20".into());
        let view = db.parcels().create(input).await.unwrap();

        assert!(view.parcel.is_consistent());
        assert_eq!(view.parcel.available + view.parcel.reserved, view.parcel.total_quantity);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_quantities() {
        let db = setup().await;
        let wh = warehouse(&db, "WH-1").await;

        let mut input = parcel_input(&wh, "100", "80");
        input.reserved = Some("30".into());
        let err = db.parcels().create(input).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::InvalidInput(CoreError::QuantityExceedsTotal { .. })
        ));

        let err = db.parcels().create(parcel_input(&wh, "ten", "1")).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidInput(CoreError::InvalidDecimal { .. })));

        let found = db.parcels().find_all(&ParcelFilter::default()).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_create_missing_warehouse() {
        let db = setup().await;
        let err = db.parcels().create(parcel_input("nowhere", "1", "1")).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Warehouse"));
    }

    #[tokio::test]
    async fn test_create_joins_variant_and_profile() {
        let db = setup().await;
        let wh = warehouse(&db, "WH-1").await;
        let profile_id = profile(&db).await;
        let product = db
            .catalog()
            .create_product(CreateProductInput { name: "Solitaire".into() })
            .await
            .unwrap();
        let variant = db
            .catalog()
            .create_variant(CreateVariantInput {
                product_id: product.id.clone(),
                sku: "SOL-1CT".into(),
            })
            .await
            .unwrap();

        let mut input = parcel_input(&wh, "10", "10");
        input.variant_id = Some(variant.id.clone());
        input.stone_profile_id = Some(profile_id.clone());
        let view = db.parcels().create(input).await.unwrap();

        let v = view.variant.unwrap();
        assert_eq!(v.sku, "SOL-1CT");
        assert_eq!(v.product.name, "Solitaire");
        assert_eq!(view.stone_profile.unwrap().id, profile_id);
    }

    #[tokio::test]
    async fn test_find_all_filters_and_orders_by_received() {
        let db = setup().await;
        let wh1 = warehouse(&db, "WH-1").await;
        let wh2 = warehouse(&db, "WH-2").await;
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();

        for (i, wh) in [&wh1, &wh2, &wh1].into_iter().enumerate() {
            let mut input = parcel_input(wh, "5", "5");
            input.parcel_code = format!("PRC-{}", i);
            input.received_at = Some(base + Duration::days(i as i64));
            db.parcels().create(input).await.unwrap();
        }

        let all = db.parcels().find_all(&ParcelFilter::default()).await.unwrap();
        let codes: Vec<_> = all.iter().map(|l| l.parcel.parcel_code.as_str()).collect();
        assert_eq!(codes, vec!["PRC-2", "PRC-1", "PRC-0"]);

        let in_wh1 = db
            .parcels()
            .find_all(&ParcelFilter {
                warehouse_id: Some(wh1.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(in_wh1.len(), 2);
        assert!(in_wh1.iter().all(|l| l.warehouse.id == wh1 && l.stone_count == 0));

        let single = db
            .parcels()
            .find_all(&ParcelFilter {
                tracking_mode: Some(TrackingMode::Single),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(single.is_empty());
    }

    #[tokio::test]
    async fn test_partial_reserved_update_leaves_available() {
        let db = setup().await;
        let wh = warehouse(&db, "WH-1").await;
        let created = db.parcels().create(parcel_input(&wh, "100", "100")).await.unwrap();

        let update: UpdateParcelInput = serde_json::from_value(json!({ "reserved": "30" })).unwrap();
        let updated = db.parcels().update(&created.parcel.id, update).await.unwrap();

        assert_eq!(updated.parcel.total_quantity, d("100"));
        assert_eq!(updated.parcel.available, d("100"));
        assert_eq!(updated.parcel.reserved, d("30"));
        assert!(!updated.parcel.is_consistent());
    }

    #[tokio::test]
    async fn test_full_quantity_update_is_checked() {
        let db = setup().await;
        let wh = warehouse(&db, "WH-1").await;
        let created = db.parcels().create(parcel_input(&wh, "100", "100")).await.unwrap();
        let id = created.parcel.id.clone();

        let update: UpdateParcelInput = serde_json::from_value(json!({
            "totalQuantity": "100", "available": "80", "reserved": "30"
        }))
        .unwrap();
        let err = db.parcels().update(&id, update).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidInput(_)));

        let update: UpdateParcelInput = serde_json::from_value(json!({
            "totalQuantity": "100", "available": "70", "reserved": "30"
        }))
        .unwrap();
        let updated = db.parcels().update(&id, update).await.unwrap();
        assert!(updated.parcel.is_consistent());
        assert_eq!(updated.parcel.available, d("70"));
    }

    #[tokio::test]
    async fn test_update_null_disconnects_variant() {
        let db = setup().await;
        let wh = warehouse(&db, "WH-1").await;
        let product = db
            .catalog()
            .create_product(CreateProductInput { name: "Ring".into() })
            .await
            .unwrap();
        let variant = db
            .catalog()
            .create_variant(CreateVariantInput {
                product_id: product.id,
                sku: "RING-7".into(),
            })
            .await
            .unwrap();

        let mut input = parcel_input(&wh, "1", "1");
        input.variant_id = Some(variant.id);
        input.notes = Some("keep".into());
        let created = db.parcels().create(input).await.unwrap();
        assert!(created.variant.is_some());

        let update: UpdateParcelInput =
            serde_json::from_value(json!({ "variantId": null, "status": "ON_MEMO" })).unwrap();
        let updated = db.parcels().update(&created.parcel.id, update).await.unwrap();

        assert_eq!(updated.parcel.variant_id, None);
        assert!(updated.variant.is_none());
        assert_eq!(updated.parcel.status, ParcelStatus::OnMemo);
        assert_eq!(updated.parcel.notes.as_deref(), Some("keep"));
    }

    #[tokio::test]
    async fn test_update_not_found_cases() {
        let db = setup().await;
        let err = db
            .parcels()
            .update("missing", UpdateParcelInput::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let wh = warehouse(&db, "WH-1").await;
        let created = db.parcels().create(parcel_input(&wh, "1", "1")).await.unwrap();
        let update = UpdateParcelInput {
            warehouse_id: Some("elsewhere".into()),
            ..Default::default()
        };
        let err = db.parcels().update(&created.parcel.id, update).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Warehouse"));

        let unchanged = db.parcels().find_one(&created.parcel.id).await.unwrap();
        assert_eq!(unchanged.parcel.warehouse_id, wh);
    }

    #[tokio::test]
    async fn test_find_one_detail() {
        let db = setup().await;
        let wh = warehouse(&db, "WH-1").await;
        let profile_id = profile(&db).await;
        let parcel = single_parcel(&db, &wh, StoneUnit::Carat, "10").await;

        for code in ["ST-03", "ST-01", "ST-02"] {
            db.stones()
                .create_one(CreateStoneInput {
                    parcel_id: parcel.id.clone(),
                    stone_profile_id: profile_id.clone(),
                    stone: stone_fields(code, "0.5"),
                })
                .await
                .unwrap();
        }
        for i in 0..12 {
            db.parcels()
                .record_transaction(&parcel.id, tx_input(TransactionKind::Adjustment, &i.to_string()))
                .await
                .unwrap();
        }

        let detail = db.parcels().find_one(&parcel.id).await.unwrap();
        let codes: Vec<_> = detail.stones.iter().map(|s| s.stone_code.as_str()).collect();
        assert_eq!(codes, vec!["ST-01", "ST-02", "ST-03"]);
        assert_eq!(detail.stone_count, 3);
        assert_eq!(detail.transaction_count, 12);
        assert_eq!(detail.transactions.len(), RECENT_TRANSACTION_LIMIT as usize);
        assert!(detail.stone_profile.is_none());

        assert!(db.parcels().find_one("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_view_previews_available_stones_only() {
        let db = setup().await;
        let wh = warehouse(&db, "WH-1").await;
        let profile_id = profile(&db).await;
        let parcel = single_parcel(&db, &wh, StoneUnit::Piece, "20").await;

        for i in 0..12 {
            let mut fields = stone_fields(&format!("ST-{:02}", i), "0.1");
            if i == 0 {
                fields.status = Some(StoneStatus::Sold);
            }
            db.stones()
                .create_one(CreateStoneInput {
                    parcel_id: parcel.id.clone(),
                    stone_profile_id: profile_id.clone(),
                    stone: fields,
                })
                .await
                .unwrap();
        }

        let view = db
            .parcels()
            .update(&parcel.id, UpdateParcelInput::default())
            .await
            .unwrap();
        assert_eq!(view.stones.len(), AVAILABLE_STONE_PREVIEW_LIMIT as usize);
        assert_eq!(view.stones[0].stone_code, "ST-01");
        assert!(view.stones.iter().all(|s| s.status == StoneStatus::Available));
    }

    #[tokio::test]
    async fn test_single_parcel_with_stones_stays_single() {
        let db = setup().await;
        let wh = warehouse(&db, "WH-1").await;
        let profile_id = profile(&db).await;
        let parcel = single_parcel(&db, &wh, StoneUnit::Carat, "5").await;
        let empty = single_parcel(&db, &wh, StoneUnit::Carat, "5").await;

        db.stones()
            .create_one(CreateStoneInput {
                parcel_id: parcel.id.clone(),
                stone_profile_id: profile_id,
                stone: stone_fields("ST-1", "1.00"),
            })
            .await
            .unwrap();

        let to_bulk = || UpdateParcelInput {
            tracking_mode: Some(TrackingMode::Bulk),
            ..Default::default()
        };

        let err = db.parcels().update(&parcel.id, to_bulk()).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::InvalidInput(CoreError::TrackingModeMismatch { .. })
        ));
        let kept = db.parcels().find_one(&parcel.id).await.unwrap();
        assert_eq!(kept.parcel.tracking_mode, TrackingMode::Single);
        assert_eq!(kept.stone_count, 1);

        let view = db.parcels().update(&empty.id, to_bulk()).await.unwrap();
        assert_eq!(view.parcel.tracking_mode, TrackingMode::Bulk);
    }

    #[tokio::test]
    async fn test_remove_cascades_to_stones_and_history() {
        let db = setup().await;
        let wh = warehouse(&db, "WH-1").await;
        let profile_id = profile(&db).await;
        let parcel = single_parcel(&db, &wh, StoneUnit::Carat, "5").await;

        let stone = db
            .stones()
            .create_one(CreateStoneInput {
                parcel_id: parcel.id.clone(),
                stone_profile_id: profile_id,
                stone: stone_fields("ST-1", "1.01"),
            })
            .await
            .unwrap();
        db.parcels()
            .record_transaction(&parcel.id, tx_input(TransactionKind::Receive, "5"))
            .await
            .unwrap();

        db.parcels().remove(&parcel.id).await.unwrap();

        assert!(db.stones().find_one(&stone.id).await.unwrap_err().is_not_found());
        let history: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM parcel_transactions")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(history, 0);

        assert!(db.parcels().remove(&parcel.id).await.unwrap_err().is_not_found());
        db.warehouses().remove(&wh).await.unwrap();
    }

    #[tokio::test]
    async fn test_record_transaction_leaves_quantities() {
        let db = setup().await;
        let wh = warehouse(&db, "WH-1").await;
        let created = db.parcels().create(parcel_input(&wh, "100", "100")).await.unwrap();

        let entry = db
            .parcels()
            .record_transaction(
                &created.parcel.id,
                RecordTransactionInput {
                    reference: Some("INV-9".into()),
                    ..tx_input(TransactionKind::Sale, "12.5")
                },
            )
            .await
            .unwrap();
        assert_eq!(entry.quantity, d("12.5"));

        let history = db.parcels().recent_transactions(&created.parcel.id, 5).await.unwrap();
        assert_eq!(history, vec![entry]);

        let after = db.parcels().find_one(&created.parcel.id).await.unwrap();
        assert_eq!(after.parcel.available, d("100"));

        let err = db
            .parcels()
            .record_transaction("missing", tx_input(TransactionKind::Sale, "1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(db.parcels().recent_transactions("missing", 5).await.unwrap_err().is_not_found());
    }
}
