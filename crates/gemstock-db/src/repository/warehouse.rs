//! # Warehouse Repository
//!
//! Warehouse records and the single-primary-per-shop invariant.
//!
//! ## Primary Demotion
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create/update with isPrimary = true, shop S                           │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    UPDATE warehouses SET is_primary = 0                                │
//! │     WHERE shop_id = S AND is_primary = 1 AND id <> self                │
//! │    INSERT / UPDATE self with is_primary = 1                            │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  The partial unique index idx_warehouses_one_primary rejects a racing  │
//! │  second primary instead of letting both commit.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use gemstock_core::input::{CreateWarehouseInput, UpdateWarehouseInput, WarehouseFilter};
use gemstock_core::ledger::apply_warehouse_patch;
use gemstock_core::summary::StockEntry;
use gemstock_core::{
    ParcelStatus, ShopSummary, StockSummary, StoneUnit, Warehouse, WarehouseListing,
    WarehouseView,
};

use super::rows::{dec, new_id, opt_dec, ShopJoin, WarehouseRow, WAREHOUSE_COLUMNS};
use crate::error::{DbError, DbResult};

#[derive(Debug, FromRow)]
struct WarehouseListingRow {
    #[sqlx(flatten)]
    warehouse: WarehouseRow,
    #[sqlx(flatten)]
    shop: ShopJoin,
    parcel_count: i64,
}

impl TryFrom<WarehouseListingRow> for WarehouseListing {
    type Error = DbError;

    fn try_from(row: WarehouseListingRow) -> DbResult<Self> {
        let warehouse = Warehouse::try_from(row.warehouse)?;
        let shop = row.shop.summary(warehouse.shop_id.as_ref());
        Ok(WarehouseListing {
            warehouse,
            shop,
            parcel_count: row.parcel_count,
        })
    }
}

fn listing_select() -> String {
    format!(
        r#"
        SELECT {WAREHOUSE_COLUMNS},
               s.name AS shop_name, s.slug AS shop_slug,
               (SELECT COUNT(*) FROM parcels p WHERE p.warehouse_id = w.id) AS parcel_count
        FROM warehouses w
        LEFT JOIN shops s ON s.id = w.shop_id
        "#
    )
}

/// Repository for warehouse operations.
#[derive(Debug, Clone)]
pub struct WarehouseRepository {
    pool: SqlitePool,
}

impl WarehouseRepository {
    /// Creates a new WarehouseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WarehouseRepository { pool }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Creates a warehouse.
    ///
    /// A blank `shopId` is stored as no shop. When the new warehouse is
    /// primary and belongs to a shop, the shop's current primary is demoted in
    /// the same transaction.
    pub async fn create(&self, input: CreateWarehouseInput) -> DbResult<WarehouseView> {
        let new = input.validate()?;
        let id = new_id();
        let now = Utc::now();

        debug!(id = %id, code = %new.code, shop_id = ?new.shop_id, primary = new.is_primary, "Creating warehouse");

        let mut tx = self.pool.begin().await?;

        if new.is_primary {
            if let Some(shop_id) = new.shop_id.as_deref() {
                demote_primaries(&mut tx, shop_id, None, now).await?;
            }
        }

        sqlx::query(
            r#"
            INSERT INTO warehouses (
                id, shop_id, name, code, type,
                address, city, state, country, postal_code, phone, email,
                is_active, is_primary, is_system, max_capacity, notes,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17,
                ?18, ?18
            )
            "#,
        )
        .bind(&id)
        .bind(&new.shop_id)
        .bind(&new.name)
        .bind(&new.code)
        .bind(new.warehouse_type)
        .bind(&new.address)
        .bind(&new.city)
        .bind(&new.state)
        .bind(&new.country)
        .bind(&new.postal_code)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(new.is_active)
        .bind(new.is_primary)
        .bind(new.is_system)
        .bind(opt_dec(new.max_capacity))
        .bind(&new.notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let warehouse = fetch_warehouse(&mut tx, &id).await?;
        let shop = fetch_shop_summary(&mut tx, warehouse.shop_id.as_deref()).await?;

        tx.commit().await?;

        info!(id = %id, code = %warehouse.code, "Warehouse created");
        Ok(WarehouseView { warehouse, shop })
    }

    /// Applies a partial update.
    ///
    /// When the result is primary and belongs to a shop, every other primary of
    /// that shop is demoted in the same transaction.
    pub async fn update(&self, id: &str, input: UpdateWarehouseInput) -> DbResult<WarehouseView> {
        let patch = input.validate()?;
        let now = Utc::now();

        debug!(id = %id, "Updating warehouse");

        let mut tx = self.pool.begin().await?;

        // Writing first takes SQLite's write lock for the whole read-modify-write.
        touch(&mut tx, id, now).await?;

        let mut warehouse = fetch_warehouse(&mut tx, id).await?;
        apply_warehouse_patch(&mut warehouse, patch, now);

        if warehouse.is_primary {
            if let Some(shop_id) = warehouse.shop_id.as_deref() {
                demote_primaries(&mut tx, shop_id, Some(id), now).await?;
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE warehouses SET
                shop_id = ?2, name = ?3, code = ?4, type = ?5,
                address = ?6, city = ?7, state = ?8, country = ?9,
                postal_code = ?10, phone = ?11, email = ?12,
                is_active = ?13, is_primary = ?14, is_system = ?15,
                max_capacity = ?16, notes = ?17, updated_at = ?18
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&warehouse.shop_id)
        .bind(&warehouse.name)
        .bind(&warehouse.code)
        .bind(warehouse.warehouse_type)
        .bind(&warehouse.address)
        .bind(&warehouse.city)
        .bind(&warehouse.state)
        .bind(&warehouse.country)
        .bind(&warehouse.postal_code)
        .bind(&warehouse.phone)
        .bind(&warehouse.email)
        .bind(warehouse.is_active)
        .bind(warehouse.is_primary)
        .bind(warehouse.is_system)
        .bind(opt_dec(warehouse.max_capacity))
        .bind(&warehouse.notes)
        .bind(warehouse.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Warehouse", id));
        }

        let shop = fetch_shop_summary(&mut tx, warehouse.shop_id.as_deref()).await?;
        tx.commit().await?;

        Ok(WarehouseView { warehouse, shop })
    }

    /// Deletes a warehouse that holds no parcels.
    ///
    /// ## Errors
    /// - `NotFound` if the warehouse doesn't exist
    /// - `Conflict` naming the parcel count otherwise
    pub async fn remove(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Removing warehouse");

        let mut tx = self.pool.begin().await?;

        let parcel_count: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT (SELECT COUNT(*) FROM parcels p WHERE p.warehouse_id = w.id)
            FROM warehouses w
            WHERE w.id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        match parcel_count {
            None => return Err(DbError::not_found("Warehouse", id)),
            Some(n) if n > 0 => {
                return Err(DbError::Conflict(format!(
                    "Cannot delete warehouse with {} parcels. Please relocate or remove parcels first.",
                    n
                )))
            }
            Some(_) => {}
        }

        let result = sqlx::query("DELETE FROM warehouses WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Warehouse", id));
        }

        tx.commit().await?;
        info!(id = %id, "Warehouse deleted");
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Lists warehouses matching every provided filter, primary first, then
    /// by name.
    pub async fn find_all(&self, filter: &WarehouseFilter) -> DbResult<Vec<WarehouseListing>> {
        debug!(?filter, "Listing warehouses");

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(listing_select());
        query.push(" WHERE 1 = 1");

        if let Some(shop_id) = &filter.shop_id {
            query.push(" AND w.shop_id = ").push_bind(shop_id.clone());
        }
        if let Some(active) = filter.is_active {
            query.push(" AND w.is_active = ").push_bind(active);
        }
        if let Some(t) = filter.warehouse_type {
            query.push(" AND w.type = ").push_bind(t);
        }

        query.push(" ORDER BY w.is_primary DESC, w.name ASC");

        let rows: Vec<WarehouseListingRow> = query.build_query_as().fetch_all(&self.pool).await?;

        debug!(count = rows.len(), "Warehouses listed");
        rows.into_iter().map(WarehouseListing::try_from).collect()
    }

    /// Gets one warehouse with its shop summary and parcel count.
    pub async fn find_one(&self, id: &str) -> DbResult<WarehouseListing> {
        let sql = format!("{} WHERE w.id = ?1", listing_select());

        let row: Option<WarehouseListingRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or_else(|| DbError::not_found("Warehouse", id))?
            .try_into()
    }

    /// Aggregates the quantities of every parcel in a warehouse.
    ///
    /// Recomputed on every call.
    ///
    /// ## Errors
    /// - `NotFound` if the warehouse doesn't exist
    /// - `InvalidInput` when a total leaves the decimal range
    pub async fn stock_summary(&self, warehouse_id: &str) -> DbResult<StockSummary> {
        let mut conn = self.pool.acquire().await?;

        if !warehouse_exists(&mut conn, warehouse_id).await? {
            return Err(DbError::not_found("Warehouse", warehouse_id));
        }

        let rows: Vec<(String, ParcelStatus, StoneUnit, String, String)> = sqlx::query_as(
            "SELECT id, status, unit, available, reserved FROM parcels WHERE warehouse_id = ?1",
        )
        .bind(warehouse_id)
        .fetch_all(&mut *conn)
        .await?;

        let entries = rows
            .into_iter()
            .map(|(id, status, unit, available, reserved)| {
                let parse = |field: &str, text: &str| {
                    gemstock_core::decimal::from_stored(field, text)
                        .map_err(|e| DbError::corrupt("Parcel", id.as_str(), e))
                };
                Ok(StockEntry {
                    status,
                    unit,
                    available: parse("available", &available)?,
                    reserved: parse("reserved", &reserved)?,
                })
            })
            .collect::<DbResult<Vec<_>>>()?;

        let summary = StockSummary::compute(entries)?;
        debug!(
            warehouse_id = %warehouse_id,
            parcels = summary.total_parcels,
            available = %dec(summary.total_available),
            "Stock summary computed"
        );
        Ok(summary)
    }

    /// Counts warehouses that are currently primary for `shop_id`.
    pub async fn count_primaries(&self, shop_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM warehouses WHERE shop_id = ?1 AND is_primary = 1",
        )
        .bind(shop_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level Helpers
// =============================================================================

/// Demotes every primary warehouse of `shop_id` except `keep`.
async fn demote_primaries(
    conn: &mut SqliteConnection,
    shop_id: &str,
    keep: Option<&str>,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE warehouses SET is_primary = 0, updated_at = ?3
        WHERE shop_id = ?1 AND is_primary = 1 AND (?2 IS NULL OR id <> ?2)
        "#,
    )
    .bind(shop_id)
    .bind(keep)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() > 0 {
        debug!(shop_id = %shop_id, demoted = result.rows_affected(), "Demoted primary warehouse");
    }
    Ok(result.rows_affected())
}

/// Bumps `updated_at`, failing with NotFound when the row is absent.
async fn touch(conn: &mut SqliteConnection, id: &str, now: DateTime<Utc>) -> DbResult<()> {
    let result = sqlx::query("UPDATE warehouses SET updated_at = ?2 WHERE id = ?1")
        .bind(id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Warehouse", id));
    }
    Ok(())
}

pub(crate) async fn warehouse_exists(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM warehouses WHERE id = ?1)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

async fn fetch_warehouse(conn: &mut SqliteConnection, id: &str) -> DbResult<Warehouse> {
    let sql = format!("SELECT {WAREHOUSE_COLUMNS} FROM warehouses w WHERE w.id = ?1");
    let row: Option<WarehouseRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.ok_or_else(|| DbError::not_found("Warehouse", id))?
        .try_into()
}

async fn fetch_shop_summary(
    conn: &mut SqliteConnection,
    shop_id: Option<&str>,
) -> DbResult<Option<ShopSummary>> {
    let Some(shop_id) = shop_id else {
        return Ok(None);
    };

    let row: Option<(String, String, String)> =
        sqlx::query_as("SELECT id, name, slug FROM shops WHERE id = ?1")
            .bind(shop_id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(row.map(|(id, name, slug)| ShopSummary { id, name, slug }))
}

// =============================================================================
// Unit Tests
// =============================================================================
