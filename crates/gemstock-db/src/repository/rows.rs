//! Raw row types and their conversion into domain records.
//!
//! Decimal columns are TEXT, so rows carry `String`s and convert with
//! `TryFrom`. A value that fails to parse is reported as
//! [`DbError::CorruptRecord`] rather than silently zeroed.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use gemstock_core::decimal::{from_stored, from_stored_opt};
use gemstock_core::{
    FinishType, Parcel, ParcelStatus, ParcelTransaction, ProductSummary, ShopSummary, Stone,
    StoneProfile, StoneProfileSummary, StoneStatus, StoneType, StoneUnit, TrackingMode,
    TransactionKind, VariantSummary, Warehouse, WarehouseSummary, WarehouseType,
};

use crate::error::{DbError, DbResult};

// =============================================================================
// Column Lists
// =============================================================================

pub(crate) const WAREHOUSE_COLUMNS: &str = r#"
    w.id, w.shop_id, w.name, w.code, w.type AS warehouse_type,
    w.address, w.city, w.state, w.country, w.postal_code, w.phone, w.email,
    w.is_active, w.is_primary, w.is_system, w.max_capacity, w.notes,
    w.created_at, w.updated_at
"#;

pub(crate) const PARCEL_COLUMNS: &str = r#"
    p.id, p.warehouse_id, p.shop_id, p.variant_id, p.parcel_code, p.supplier_ref,
    p.tracking_mode, p.stone_type, p.stone_profile_id, p.origin, p.quality_grade,
    p.certification, p.parcel_report_ref, p.unit, p.total_quantity, p.available,
    p.reserved, p.min_order_qty, p.cost_price, p.wholesale_price, p.retail_price,
    p.status, p.sellable, p.notes, p.received_at, p.created_at, p.updated_at
"#;

pub(crate) const STONE_COLUMNS: &str = r#"
    st.id, st.parcel_id, st.stone_profile_id, st.stone_code, st.internal_ref,
    st.supplier_stone_ref, st.carat, st.length, st.width, st.depth,
    st.laser_inscription, st.certificate_number, st.certificate_issuer,
    st.certificate_date, st.certificate_url, st.cost_price, st.wholesale_price,
    st.retail_price, st.status, st.bin_location, st.notes, st.images,
    st.created_at, st.updated_at
"#;

pub(crate) const STONE_PROFILE_COLUMNS: &str = r#"
    sp.id, sp.stone_type, sp.shape, sp.finish_type, sp.color, sp.clarity, sp.cut,
    sp.polish, sp.symmetry, sp.fluorescence, sp.treatment, sp.origin, sp.created_at
"#;

/// Summary joins shared by parcel views and listings. Expects `p` to be the
/// parcel alias.
pub(crate) const PARCEL_JOIN_COLUMNS: &str = r#"
    w.name AS wh_name, w.code AS wh_code, w.type AS wh_type,
    v.sku AS variant_sku, pr.id AS product_id, pr.name AS product_name,
    sp.stone_type AS sp_stone_type, sp.shape AS sp_shape,
    sp.finish_type AS sp_finish_type, sp.color AS sp_color,
    sp.clarity AS sp_clarity, sp.cut AS sp_cut, sp.origin AS sp_origin
"#;

pub(crate) const PARCEL_JOINS: &str = r#"
    INNER JOIN warehouses w ON w.id = p.warehouse_id
    LEFT JOIN product_variants v ON v.id = p.variant_id
    LEFT JOIN products pr ON pr.id = v.product_id
    LEFT JOIN stone_profiles sp ON sp.id = p.stone_profile_id
"#;

// =============================================================================
// Encoding Helpers
// =============================================================================

/// Canonical TEXT for a decimal column.
pub(crate) fn dec(value: Decimal) -> String {
    value.to_string()
}

/// Canonical TEXT for an optional decimal column.
pub(crate) fn opt_dec(value: Option<Decimal>) -> Option<String> {
    value.map(dec)
}

/// Generates a new record ID.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn decimal(entity: &str, id: &str, field: &str, text: &str) -> DbResult<Decimal> {
    from_stored(field, text).map_err(|e| DbError::corrupt(entity, id, e))
}

fn opt_decimal(entity: &str, id: &str, field: &str, text: Option<&str>) -> DbResult<Option<Decimal>> {
    from_stored_opt(field, text).map_err(|e| DbError::corrupt(entity, id, e))
}

// =============================================================================
// Warehouse
// =============================================================================

#[derive(Debug, FromRow)]
pub(crate) struct WarehouseRow {
    pub id: String,
    pub shop_id: Option<String>,
    pub name: String,
    pub code: String,
    pub warehouse_type: WarehouseType,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub is_primary: bool,
    pub is_system: bool,
    pub max_capacity: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<WarehouseRow> for Warehouse {
    type Error = DbError;

    fn try_from(row: WarehouseRow) -> DbResult<Self> {
        let max_capacity =
            opt_decimal("Warehouse", &row.id, "max_capacity", row.max_capacity.as_deref())?;

        Ok(Warehouse {
            id: row.id,
            shop_id: row.shop_id,
            name: row.name,
            code: row.code,
            warehouse_type: row.warehouse_type,
            address: row.address,
            city: row.city,
            state: row.state,
            country: row.country,
            postal_code: row.postal_code,
            phone: row.phone,
            email: row.email,
            is_active: row.is_active,
            is_primary: row.is_primary,
            is_system: row.is_system,
            max_capacity,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Optional shop summary columns (`LEFT JOIN shops s`).
#[derive(Debug, FromRow)]
pub(crate) struct ShopJoin {
    pub shop_name: Option<String>,
    pub shop_slug: Option<String>,
}

impl ShopJoin {
    pub fn summary(self, shop_id: Option<&String>) -> Option<ShopSummary> {
        match (shop_id, self.shop_name, self.shop_slug) {
            (Some(id), Some(name), Some(slug)) => Some(ShopSummary {
                id: id.clone(),
                name,
                slug,
            }),
            _ => None,
        }
    }
}

// =============================================================================
// Parcel
// =============================================================================

#[derive(Debug, FromRow)]
pub(crate) struct ParcelRow {
    pub id: String,
    pub warehouse_id: String,
    pub shop_id: Option<String>,
    pub variant_id: Option<String>,
    pub parcel_code: String,
    pub supplier_ref: Option<String>,
    pub tracking_mode: TrackingMode,
    pub stone_type: Option<StoneType>,
    pub stone_profile_id: Option<String>,
    pub origin: Option<String>,
    pub quality_grade: Option<String>,
    pub certification: Option<String>,
    pub parcel_report_ref: Option<String>,
    pub unit: StoneUnit,
    pub total_quantity: String,
    pub available: String,
    pub reserved: String,
    pub min_order_qty: Option<String>,
    pub cost_price: Option<String>,
    pub wholesale_price: Option<String>,
    pub retail_price: Option<String>,
    pub status: ParcelStatus,
    pub sellable: bool,
    pub notes: Option<String>,
    pub received_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ParcelRow> for Parcel {
    type Error = DbError;

    fn try_from(row: ParcelRow) -> DbResult<Self> {
        let id = row.id.as_str();
        let total_quantity = decimal("Parcel", id, "total_quantity", &row.total_quantity)?;
        let available = decimal("Parcel", id, "available", &row.available)?;
        let reserved = decimal("Parcel", id, "reserved", &row.reserved)?;
        let min_order_qty = opt_decimal("Parcel", id, "min_order_qty", row.min_order_qty.as_deref())?;
        let cost_price = opt_decimal("Parcel", id, "cost_price", row.cost_price.as_deref())?;
        let wholesale_price =
            opt_decimal("Parcel", id, "wholesale_price", row.wholesale_price.as_deref())?;
        let retail_price = opt_decimal("Parcel", id, "retail_price", row.retail_price.as_deref())?;

        Ok(Parcel {
            id: row.id,
            warehouse_id: row.warehouse_id,
            shop_id: row.shop_id,
            variant_id: row.variant_id,
            parcel_code: row.parcel_code,
            supplier_ref: row.supplier_ref,
            tracking_mode: row.tracking_mode,
            stone_type: row.stone_type,
            stone_profile_id: row.stone_profile_id,
            origin: row.origin,
            quality_grade: row.quality_grade,
            certification: row.certification,
            parcel_report_ref: row.parcel_report_ref,
            unit: row.unit,
            total_quantity,
            available,
            reserved,
            min_order_qty,
            cost_price,
            wholesale_price,
            retail_price,
            status: row.status,
            sellable: row.sellable,
            notes: row.notes,
            received_at: row.received_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Summary columns selected with [`PARCEL_JOIN_COLUMNS`].
#[derive(Debug, FromRow)]
pub(crate) struct ParcelJoin {
    pub wh_name: String,
    pub wh_code: String,
    pub wh_type: WarehouseType,
    pub variant_sku: Option<String>,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub sp_stone_type: Option<StoneType>,
    pub sp_shape: Option<String>,
    pub sp_finish_type: Option<FinishType>,
    pub sp_color: Option<String>,
    pub sp_clarity: Option<String>,
    pub sp_cut: Option<String>,
    pub sp_origin: Option<String>,
}

/// Related-record summaries of one parcel.
pub(crate) struct ParcelSummaries {
    pub warehouse: WarehouseSummary,
    pub variant: Option<VariantSummary>,
    pub stone_profile: Option<StoneProfileSummary>,
}

impl ParcelJoin {
    pub fn into_summaries(self, parcel: &Parcel) -> ParcelSummaries {
        let variant = match (&parcel.variant_id, self.variant_sku, self.product_id, self.product_name) {
            (Some(id), Some(sku), Some(product_id), Some(product_name)) => Some(VariantSummary {
                id: id.clone(),
                sku,
                product: ProductSummary {
                    id: product_id,
                    name: product_name,
                },
            }),
            _ => None,
        };

        let stone_profile = match (&parcel.stone_profile_id, self.sp_stone_type, self.sp_finish_type) {
            (Some(id), Some(stone_type), Some(finish_type)) => Some(StoneProfileSummary {
                id: id.clone(),
                stone_type,
                shape: self.sp_shape,
                finish_type,
                color: self.sp_color,
                clarity: self.sp_clarity,
                cut: self.sp_cut,
                origin: self.sp_origin,
            }),
            _ => None,
        };

        ParcelSummaries {
            warehouse: WarehouseSummary {
                id: parcel.warehouse_id.clone(),
                name: self.wh_name,
                code: self.wh_code,
                warehouse_type: self.wh_type,
            },
            variant,
            stone_profile,
        }
    }
}

// =============================================================================
// Stone
// =============================================================================

#[derive(Debug, FromRow)]
pub(crate) struct StoneRow {
    pub id: String,
    pub parcel_id: String,
    pub stone_profile_id: String,
    pub stone_code: String,
    pub internal_ref: Option<String>,
    pub supplier_stone_ref: Option<String>,
    pub carat: String,
    pub length: Option<String>,
    pub width: Option<String>,
    pub depth: Option<String>,
    pub laser_inscription: Option<String>,
    pub certificate_number: Option<String>,
    pub certificate_issuer: Option<String>,
    pub certificate_date: Option<NaiveDate>,
    pub certificate_url: Option<String>,
    pub cost_price: Option<String>,
    pub wholesale_price: Option<String>,
    pub retail_price: Option<String>,
    pub status: StoneStatus,
    pub bin_location: Option<String>,
    pub notes: Option<String>,
    pub images: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<StoneRow> for Stone {
    type Error = DbError;

    fn try_from(row: StoneRow) -> DbResult<Self> {
        let id = row.id.as_str();
        let carat = decimal("Stone", id, "carat", &row.carat)?;
        let length = opt_decimal("Stone", id, "length", row.length.as_deref())?;
        let width = opt_decimal("Stone", id, "width", row.width.as_deref())?;
        let depth = opt_decimal("Stone", id, "depth", row.depth.as_deref())?;
        let cost_price = opt_decimal("Stone", id, "cost_price", row.cost_price.as_deref())?;
        let wholesale_price =
            opt_decimal("Stone", id, "wholesale_price", row.wholesale_price.as_deref())?;
        let retail_price = opt_decimal("Stone", id, "retail_price", row.retail_price.as_deref())?;
        let images: Vec<String> =
            serde_json::from_str(&row.images).map_err(|e| DbError::corrupt("Stone", id, e))?;

        Ok(Stone {
            id: row.id,
            parcel_id: row.parcel_id,
            stone_profile_id: row.stone_profile_id,
            stone_code: row.stone_code,
            internal_ref: row.internal_ref,
            supplier_stone_ref: row.supplier_stone_ref,
            carat,
            length,
            width,
            depth,
            laser_inscription: row.laser_inscription,
            certificate_number: row.certificate_number,
            certificate_issuer: row.certificate_issuer,
            certificate_date: row.certificate_date,
            certificate_url: row.certificate_url,
            cost_price,
            wholesale_price,
            retail_price,
            status: row.status,
            bin_location: row.bin_location,
            notes: row.notes,
            images,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Stone Profile / Transaction
// =============================================================================

#[derive(Debug, FromRow)]
pub(crate) struct StoneProfileRow {
    pub id: String,
    pub stone_type: StoneType,
    pub shape: Option<String>,
    pub finish_type: FinishType,
    pub color: Option<String>,
    pub clarity: Option<String>,
    pub cut: Option<String>,
    pub polish: Option<String>,
    pub symmetry: Option<String>,
    pub fluorescence: Option<String>,
    pub treatment: Option<String>,
    pub origin: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<StoneProfileRow> for StoneProfile {
    fn from(row: StoneProfileRow) -> Self {
        StoneProfile {
            id: row.id,
            stone_type: row.stone_type,
            shape: row.shape,
            finish_type: row.finish_type,
            color: row.color,
            clarity: row.clarity,
            cut: row.cut,
            polish: row.polish,
            symmetry: row.symmetry,
            fluorescence: row.fluorescence,
            treatment: row.treatment,
            origin: row.origin,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct TransactionRow {
    pub id: String,
    pub parcel_id: String,
    pub kind: TransactionKind,
    pub quantity: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for ParcelTransaction {
    type Error = DbError;

    fn try_from(row: TransactionRow) -> DbResult<Self> {
        let quantity = decimal("ParcelTransaction", &row.id, "quantity", &row.quantity)?;
        Ok(ParcelTransaction {
            id: row.id,
            parcel_id: row.parcel_id,
            kind: row.kind,
            quantity,
            reference: row.reference,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

/// Converts every row, failing on the first corrupt one.
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> DbResult<Vec<T>>
where
    T: TryFrom<R, Error = DbError>,
{
    rows.into_iter().map(T::try_from).collect()
}
