//! # Stone Repository
//!
//! Individually registered stones of SINGLE-tracked parcels.
//!
//! Stone writes never touch the parent parcel's quantities. Callers bring a
//! parcel back in line with its stones through [`StoneRepository::reconcile_parcel`].
//!
//! ## Batch Registration
//! ```text
//! BulkCreateStonesInput ──validate()──► Vec<NewStone>     (first bad entry aborts)
//!                                          │
//!                                BEGIN     ▼
//!                                  parcel exists? SINGLE?
//!                                  INSERT stone[0..n]     (any failure rolls back)
//!                                COMMIT
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use gemstock_core::input::{
    BulkCreateStonesInput, CreateStoneInput, NewStone, StoneQuery, UpdateStoneInput,
};
use gemstock_core::ledger::{apply_stone_patch, reconcile, require_single};
use gemstock_core::{Parcel, Stone};

use super::parcel::fetch_parcel;
use super::rows::{convert_all, dec, new_id, opt_dec, StoneRow, STONE_COLUMNS};
use crate::error::{DbError, DbResult};

/// Repository for stone operations.
#[derive(Debug, Clone)]
pub struct StoneRepository {
    pool: SqlitePool,
}

impl StoneRepository {
    /// Creates a new StoneRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StoneRepository { pool }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Registers one stone against a SINGLE parcel.
    ///
    /// ## Errors
    /// - `NotFound` if the parcel or stone profile doesn't exist
    /// - `InvalidInput` if the parcel is BULK-tracked or a field is malformed
    /// - `UniqueViolation` if the stone code is taken within the parcel
    pub async fn create_one(&self, input: CreateStoneInput) -> DbResult<Stone> {
        let new = input.validate()?;
        let mut stones = self.insert_batch(vec![new]).await?;
        stones
            .pop()
            .ok_or_else(|| DbError::Internal("stone insert returned no rows".to_string()))
    }

    /// Registers many stones against one parcel and profile, all or nothing.
    ///
    /// Every entry is validated before anything is written; the first invalid
    /// entry fails the whole batch with its index in the field name.
    pub async fn bulk_create(&self, input: BulkCreateStonesInput) -> DbResult<Vec<Stone>> {
        let batch = input.validate()?;
        self.insert_batch(batch).await
    }

    async fn insert_batch(&self, batch: Vec<NewStone>) -> DbResult<Vec<Stone>> {
        let Some(first) = batch.first() else {
            return Ok(Vec::new());
        };
        let parcel_id = first.parcel_id.clone();
        let profile_id = first.stone_profile_id.clone();
        let now = Utc::now();

        debug!(parcel_id = %parcel_id, count = batch.len(), "Registering stones");

        let mut tx = self.pool.begin().await?;

        let parcel = fetch_parcel(&mut tx, &parcel_id).await?;
        require_single(&parcel)?;

        if !profile_exists(&mut tx, &profile_id).await? {
            return Err(DbError::not_found("StoneProfile", &profile_id));
        }

        let mut ids = Vec::with_capacity(batch.len());
        for new in &batch {
            let id = new_id();
            insert_stone(&mut tx, &id, new, now).await?;
            ids.push(id);
        }

        let mut stones = Vec::with_capacity(ids.len());
        for id in &ids {
            stones.push(fetch_stone(&mut tx, id).await?);
        }

        tx.commit().await?;

        info!(parcel_id = %parcel_id, count = stones.len(), "Stones registered");
        Ok(stones)
    }

    /// Applies a partial update. A stone cannot move between parcels.
    pub async fn update(&self, id: &str, input: UpdateStoneInput) -> DbResult<Stone> {
        let patch = input.validate()?;
        let now = Utc::now();

        debug!(id = %id, "Updating stone");

        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE stones SET updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(DbError::not_found("Stone", id));
        }

        let mut stone = fetch_stone(&mut tx, id).await?;

        if let Some(profile_id) = patch.stone_profile_id.as_deref() {
            if profile_id != stone.stone_profile_id && !profile_exists(&mut tx, profile_id).await? {
                return Err(DbError::not_found("StoneProfile", profile_id));
            }
        }

        apply_stone_patch(&mut stone, patch, now);

        let images = serde_json::to_string(&stone.images)
            .map_err(|e| DbError::Internal(format!("failed to encode images: {}", e)))?;

        let result = sqlx::query(
            r#"
            UPDATE stones SET
                stone_profile_id = ?2, stone_code = ?3, internal_ref = ?4,
                supplier_stone_ref = ?5, carat = ?6, length = ?7, width = ?8,
                depth = ?9, laser_inscription = ?10, certificate_number = ?11,
                certificate_issuer = ?12, certificate_date = ?13,
                certificate_url = ?14, cost_price = ?15, wholesale_price = ?16,
                retail_price = ?17, status = ?18, bin_location = ?19, notes = ?20,
                images = ?21, updated_at = ?22
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&stone.stone_profile_id)
        .bind(&stone.stone_code)
        .bind(&stone.internal_ref)
        .bind(&stone.supplier_stone_ref)
        .bind(dec(stone.carat))
        .bind(opt_dec(stone.length))
        .bind(opt_dec(stone.width))
        .bind(opt_dec(stone.depth))
        .bind(&stone.laser_inscription)
        .bind(&stone.certificate_number)
        .bind(&stone.certificate_issuer)
        .bind(stone.certificate_date)
        .bind(&stone.certificate_url)
        .bind(opt_dec(stone.cost_price))
        .bind(opt_dec(stone.wholesale_price))
        .bind(opt_dec(stone.retail_price))
        .bind(stone.status)
        .bind(&stone.bin_location)
        .bind(&stone.notes)
        .bind(images)
        .bind(stone.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stone", id));
        }

        tx.commit().await?;
        Ok(stone)
    }

    /// Deletes a stone. The parcel's quantities are left unchanged.
    pub async fn remove(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM stones WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stone", id));
        }

        debug!(id = %id, "Stone deleted");
        Ok(())
    }

    /// Recomputes a SINGLE parcel's `available` and `reserved` from its stones.
    ///
    /// ```text
    /// unit    per AVAILABLE/RESERVED stone
    /// CARAT   carat
    /// GRAM    carat × 0.2
    /// PIECE   1
    /// ```
    ///
    /// ## Errors
    /// - `NotFound` if the parcel doesn't exist
    /// - `InvalidInput` for BULK parcels, or when the stones would exceed
    ///   `totalQuantity` (nothing is written)
    pub async fn reconcile_parcel(&self, parcel_id: &str) -> DbResult<Parcel> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE parcels SET updated_at = ?2 WHERE id = ?1")
            .bind(parcel_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(DbError::not_found("Parcel", parcel_id));
        }

        let mut parcel = fetch_parcel(&mut tx, parcel_id).await?;

        let sql = format!("SELECT {STONE_COLUMNS} FROM stones st WHERE st.parcel_id = ?1");
        let rows: Vec<StoneRow> = sqlx::query_as(&sql)
            .bind(parcel_id)
            .fetch_all(&mut *tx)
            .await?;
        let stones: Vec<Stone> = convert_all(rows)?;

        let result = reconcile(&parcel, &stones)?;

        sqlx::query("UPDATE parcels SET available = ?2, reserved = ?3 WHERE id = ?1")
            .bind(parcel_id)
            .bind(dec(result.available))
            .bind(dec(result.reserved))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            parcel_id = %parcel_id,
            stones = stones.len(),
            available = %result.available,
            reserved = %result.reserved,
            "Parcel reconciled"
        );

        parcel.available = result.available;
        parcel.reserved = result.reserved;
        parcel.updated_at = now;
        Ok(parcel)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Gets a stone by ID.
    pub async fn find_one(&self, id: &str) -> DbResult<Stone> {
        let mut conn = self.pool.acquire().await?;
        fetch_stone(&mut conn, id).await
    }

    /// Searches stones, ordered by stone code.
    ///
    /// Equality filters run in SQL. Carat and price bounds are compared on
    /// exact decimals after loading, since the columns are TEXT.
    pub async fn query(&self, query: StoneQuery) -> DbResult<Vec<Stone>> {
        let filter = query.validate()?;
        debug!(?filter, "Querying stones");

        let mut sql: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            r#"
            SELECT {STONE_COLUMNS}
            FROM stones st
            INNER JOIN stone_profiles sp ON sp.id = st.stone_profile_id
            INNER JOIN parcels p ON p.id = st.parcel_id
            WHERE 1 = 1
            "#
        ));

        if let Some(stone_type) = filter.stone_type {
            sql.push(" AND sp.stone_type = ").push_bind(stone_type);
        }
        if let Some(status) = filter.status {
            sql.push(" AND st.status = ").push_bind(status);
        }
        if let Some(parcel_id) = &filter.parcel_id {
            sql.push(" AND st.parcel_id = ").push_bind(parcel_id.clone());
        }
        if let Some(warehouse_id) = &filter.warehouse_id {
            sql.push(" AND p.warehouse_id = ").push_bind(warehouse_id.clone());
        }
        if let Some(certificate) = &filter.certificate_number {
            sql.push(" AND st.certificate_number = ").push_bind(certificate.clone());
        }

        sql.push(" ORDER BY st.stone_code ASC, st.id ASC");

        let rows: Vec<StoneRow> = sql.build_query_as().fetch_all(&self.pool).await?;
        let stones: Vec<Stone> = convert_all(rows)?;

        let matched: Vec<Stone> = stones
            .into_iter()
            .filter(|s| filter.matches_ranges(s))
            .collect();

        debug!(count = matched.len(), "Stones matched");
        Ok(matched)
    }
}

// =============================================================================
// Connection-level Helpers
// =============================================================================

async fn insert_stone(
    conn: &mut SqliteConnection,
    id: &str,
    new: &NewStone,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let images = serde_json::to_string(&new.images)
        .map_err(|e| DbError::Internal(format!("failed to encode images: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO stones (
            id, parcel_id, stone_profile_id, stone_code, internal_ref,
            supplier_stone_ref, carat, length, width, depth, laser_inscription,
            certificate_number, certificate_issuer, certificate_date,
            certificate_url, cost_price, wholesale_price, retail_price, status,
            bin_location, notes, images, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9, ?10, ?11,
            ?12, ?13, ?14,
            ?15, ?16, ?17, ?18, ?19,
            ?20, ?21, ?22, ?23, ?23
        )
        "#,
    )
    .bind(id)
    .bind(&new.parcel_id)
    .bind(&new.stone_profile_id)
    .bind(&new.stone_code)
    .bind(&new.internal_ref)
    .bind(&new.supplier_stone_ref)
    .bind(dec(new.carat))
    .bind(opt_dec(new.length))
    .bind(opt_dec(new.width))
    .bind(opt_dec(new.depth))
    .bind(&new.laser_inscription)
    .bind(&new.certificate_number)
    .bind(&new.certificate_issuer)
    .bind(new.certificate_date)
    .bind(&new.certificate_url)
    .bind(opt_dec(new.cost_price))
    .bind(opt_dec(new.wholesale_price))
    .bind(opt_dec(new.retail_price))
    .bind(new.status)
    .bind(&new.bin_location)
    .bind(&new.notes)
    .bind(images)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn fetch_stone(conn: &mut SqliteConnection, id: &str) -> DbResult<Stone> {
    let sql = format!("SELECT {STONE_COLUMNS} FROM stones st WHERE st.id = ?1");
    let row: Option<StoneRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.ok_or_else(|| DbError::not_found("Stone", id))?
        .try_into()
}

async fn profile_exists(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM stone_profiles WHERE id = ?1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
    Ok(exists)
}

// =============================================================================
// Unit Tests
// =============================================================================
