//! # Views
//!
//! Joined read models returned by the repositories. Each view flattens its
//! base record and adds summaries of related records.
//!
//! ```text
//! WarehouseView    = Warehouse + shop?
//! WarehouseListing = Warehouse + shop? + parcelCount
//! ParcelView       = Parcel + warehouse + variant? + stoneProfile? + stones (AVAILABLE, ≤10)
//! ParcelListing    = Parcel + warehouse + variant? + stoneProfile? + stoneCount
//! ParcelDetail     = Parcel + warehouse + variant? + full stoneProfile? + all stones
//!                    + recent transactions (≤10) + stoneCount + transactionCount
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{
    FinishType, Parcel, ParcelTransaction, Stone, StoneProfile, StoneStatus, StoneType, Warehouse,
    WarehouseType,
};

// =============================================================================
// Summaries
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ShopSummary {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WarehouseSummary {
    pub id: String,
    pub name: String,
    pub code: String,
    #[serde(rename = "type")]
    pub warehouse_type: WarehouseType,
}

impl From<&Warehouse> for WarehouseSummary {
    fn from(w: &Warehouse) -> Self {
        Self {
            id: w.id.clone(),
            name: w.name.clone(),
            code: w.code.clone(),
            warehouse_type: w.warehouse_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VariantSummary {
    pub id: String,
    pub sku: String,
    pub product: ProductSummary,
}

/// Grading attributes shown on parcel listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StoneProfileSummary {
    pub id: String,
    pub stone_type: StoneType,
    pub shape: Option<String>,
    pub finish_type: FinishType,
    pub color: Option<String>,
    pub clarity: Option<String>,
    pub cut: Option<String>,
    pub origin: Option<String>,
}

impl From<&StoneProfile> for StoneProfileSummary {
    fn from(p: &StoneProfile) -> Self {
        Self {
            id: p.id.clone(),
            stone_type: p.stone_type,
            shape: p.shape.clone(),
            finish_type: p.finish_type,
            color: p.color.clone(),
            clarity: p.clarity.clone(),
            cut: p.cut.clone(),
            origin: p.origin.clone(),
        }
    }
}

/// Stone preview embedded in a [`ParcelView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StoneSummary {
    pub id: String,
    pub stone_code: String,
    #[ts(as = "String")]
    pub carat: Decimal,
    pub status: StoneStatus,
    pub certificate_number: Option<String>,
    #[ts(as = "Option<String>")]
    pub certificate_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub retail_price: Option<Decimal>,
}

impl From<&Stone> for StoneSummary {
    fn from(s: &Stone) -> Self {
        Self {
            id: s.id.clone(),
            stone_code: s.stone_code.clone(),
            carat: s.carat,
            status: s.status,
            certificate_number: s.certificate_number.clone(),
            certificate_date: s.certificate_date,
            retail_price: s.retail_price,
        }
    }
}

// =============================================================================
// Warehouse Views
// =============================================================================

/// A warehouse as returned by create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WarehouseView {
    #[serde(flatten)]
    pub warehouse: Warehouse,
    pub shop: Option<ShopSummary>,
}

/// A warehouse as returned by find_all/find_one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WarehouseListing {
    #[serde(flatten)]
    pub warehouse: Warehouse,
    pub shop: Option<ShopSummary>,
    pub parcel_count: i64,
}

// =============================================================================
// Parcel Views
// =============================================================================

/// A parcel as returned by create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ParcelView {
    #[serde(flatten)]
    pub parcel: Parcel,
    pub warehouse: WarehouseSummary,
    pub variant: Option<VariantSummary>,
    pub stone_profile: Option<StoneProfileSummary>,
    /// AVAILABLE stones only, at most `AVAILABLE_STONE_PREVIEW_LIMIT`.
    pub stones: Vec<StoneSummary>,
}

/// A parcel as returned by find_all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ParcelListing {
    #[serde(flatten)]
    pub parcel: Parcel,
    pub warehouse: WarehouseSummary,
    pub variant: Option<VariantSummary>,
    pub stone_profile: Option<StoneProfileSummary>,
    pub stone_count: i64,
}

/// A parcel with its full history, as returned by find_one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ParcelDetail {
    #[serde(flatten)]
    pub parcel: Parcel,
    pub warehouse: WarehouseSummary,
    pub variant: Option<VariantSummary>,
    pub stone_profile: Option<StoneProfile>,
    /// Every stone, ordered by stone code.
    pub stones: Vec<Stone>,
    /// Newest first, at most `RECENT_TRANSACTION_LIMIT`.
    pub transactions: Vec<ParcelTransaction>,
    pub stone_count: i64,
    pub transaction_count: i64,
}
