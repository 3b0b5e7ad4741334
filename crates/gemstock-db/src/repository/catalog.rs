//! Catalog repository: shops, users, products, variants and stone profiles.
//!
//! These records exist so that warehouses and parcels have something to point
//! at. They are created and read, never updated.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use gemstock_core::input::{
    CreateProductInput, CreateShopInput, CreateStoneProfileInput, CreateUserInput,
    CreateVariantInput,
};
use gemstock_core::{ProductSummary, ShopSummary, StoneProfile, User, VariantSummary};

use super::rows::{new_id, StoneProfileRow, STONE_PROFILE_COLUMNS};
use crate::error::{DbError, DbResult};

/// Repository for catalog records.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Shops
    // =========================================================================

    /// Creates a shop. Slugs are unique.
    pub async fn create_shop(&self, input: CreateShopInput) -> DbResult<ShopSummary> {
        let input = input.validate()?;
        let shop = ShopSummary {
            id: new_id(),
            name: input.name,
            slug: input.slug,
        };

        sqlx::query("INSERT INTO shops (id, name, slug, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&shop.id)
            .bind(&shop.name)
            .bind(&shop.slug)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        debug!(id = %shop.id, slug = %shop.slug, "Shop created");
        Ok(shop)
    }

    pub async fn find_shop(&self, id: &str) -> DbResult<ShopSummary> {
        let row: Option<(String, String, String)> =
            sqlx::query_as("SELECT id, name, slug FROM shops WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(id, name, slug)| ShopSummary { id, name, slug })
            .ok_or_else(|| DbError::not_found("Shop", id))
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Creates a user. Emails are stored lowercased and are unique.
    pub async fn create_user(&self, input: CreateUserInput) -> DbResult<User> {
        let input = input.validate()?;
        let user = User {
            id: new_id(),
            email: input.email,
            name: input.name,
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO users (id, email, name, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&user.id)
            .bind(&user.email)
            .bind(&user.name)
            .bind(user.created_at)
            .execute(&self.pool)
            .await?;

        debug!(id = %user.id, "User created");
        Ok(user)
    }

    pub async fn count_users(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn create_product(&self, input: CreateProductInput) -> DbResult<ProductSummary> {
        let input = input.validate()?;
        let product = ProductSummary {
            id: new_id(),
            name: input.name,
        };

        sqlx::query("INSERT INTO products (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&product.id)
            .bind(&product.name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        debug!(id = %product.id, "Product created");
        Ok(product)
    }

    /// Creates a variant of an existing product. SKUs are unique.
    pub async fn create_variant(&self, input: CreateVariantInput) -> DbResult<VariantSummary> {
        let input = input.validate()?;
        let mut tx = self.pool.begin().await?;

        let product_name: Option<String> =
            sqlx::query_scalar("SELECT name FROM products WHERE id = ?1")
                .bind(&input.product_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(product_name) = product_name else {
            return Err(DbError::not_found("Product", &input.product_id));
        };

        let variant = VariantSummary {
            id: new_id(),
            sku: input.sku,
            product: ProductSummary {
                id: input.product_id,
                name: product_name,
            },
        };

        sqlx::query(
            "INSERT INTO product_variants (id, product_id, sku, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&variant.id)
        .bind(&variant.product.id)
        .bind(&variant.sku)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(id = %variant.id, sku = %variant.sku, "Variant created");
        Ok(variant)
    }

    // =========================================================================
    // Stone Profiles
    // =========================================================================

    pub async fn create_stone_profile(
        &self,
        input: CreateStoneProfileInput,
    ) -> DbResult<StoneProfile> {
        let profile = StoneProfile {
            id: new_id(),
            stone_type: input.stone_type,
            shape: input.shape,
            finish_type: input.finish_type,
            color: input.color,
            clarity: input.clarity,
            cut: input.cut,
            polish: input.polish,
            symmetry: input.symmetry,
            fluorescence: input.fluorescence,
            treatment: input.treatment,
            origin: input.origin,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO stone_profiles (
                id, stone_type, shape, finish_type, color, clarity, cut,
                polish, symmetry, fluorescence, treatment, origin, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&profile.id)
        .bind(profile.stone_type)
        .bind(&profile.shape)
        .bind(profile.finish_type)
        .bind(&profile.color)
        .bind(&profile.clarity)
        .bind(&profile.cut)
        .bind(&profile.polish)
        .bind(&profile.symmetry)
        .bind(&profile.fluorescence)
        .bind(&profile.treatment)
        .bind(&profile.origin)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;

        debug!(id = %profile.id, stone_type = %profile.stone_type, "Stone profile created");
        Ok(profile)
    }

    pub async fn find_stone_profile(&self, id: &str) -> DbResult<StoneProfile> {
        let sql = format!("SELECT {STONE_PROFILE_COLUMNS} FROM stone_profiles sp WHERE sp.id = ?1");
        let row: Option<StoneProfileRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(StoneProfile::from)
            .ok_or_else(|| DbError::not_found("StoneProfile", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
