//! # Domain Types
//!
//! Core domain types used throughout Gemstock.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Warehouse     │   │     Parcel      │   │     Stone       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  warehouse_id   │◄──│  parcel_id      │       │
//! │  │  shop_id?       │   │  tracking_mode  │   │  stone_code     │       │
//! │  │  code           │   │  total/avail/   │   │  carat          │       │
//! │  │  is_primary     │   │  reserved       │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                 ▲                                       │
//! │                        ┌────────┴────────┐                              │
//! │                        │ParcelTransaction│  append-only history         │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Closed Enumerations
//! Every enumerated column is a Rust enum. Values travel as
//! SCREAMING_SNAKE_CASE text in JSON and in SQLite alike, and unknown text is
//! rejected at the boundary instead of being passed through.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, ValidationError};

/// Implements `as_str`, `Display` and `FromStr` for a closed enum.
macro_rules! impl_enum_text {
    ($t:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $t {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$t] = &[$($t::$variant),+];

            /// The stored/serialized text of this variant.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($t::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $t {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($text => Ok($t::$variant),)+
                    other => Err(ValidationError::InvalidFormat {
                        field: $field.to_string(),
                        reason: format!(
                            "unknown value '{}', expected one of: {}",
                            other,
                            [$($text),+].join(", ")
                        ),
                    }
                    .into()),
                }
            }
        }
    };
}

// =============================================================================
// Enumerations
// =============================================================================

/// Whether a warehouse is a physical location or a logical bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum WarehouseType {
    #[default]
    Physical,
    Virtual,
}

impl_enum_text!(WarehouseType, "type", {
    Physical => "PHYSICAL",
    Virtual => "VIRTUAL",
});

/// How a parcel's quantity is backed.
///
/// - `Bulk`: quantity-only, no stone records
/// - `Single`: quantity backed by individually registered stones
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum TrackingMode {
    #[default]
    Bulk,
    Single,
}

impl_enum_text!(TrackingMode, "trackingMode", {
    Bulk => "BULK",
    Single => "SINGLE",
});

/// Unit of measure for parcel quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum StoneUnit {
    Carat,
    Gram,
    Piece,
}

impl_enum_text!(StoneUnit, "unit", {
    Carat => "CARAT",
    Gram => "GRAM",
    Piece => "PIECE",
});

/// Lifecycle status of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ParcelStatus {
    #[default]
    InStock,
    Reserved,
    OnMemo,
    InTransit,
    Sold,
    Damaged,
}

impl_enum_text!(ParcelStatus, "status", {
    InStock => "IN_STOCK",
    Reserved => "RESERVED",
    OnMemo => "ON_MEMO",
    InTransit => "IN_TRANSIT",
    Sold => "SOLD",
    Damaged => "DAMAGED",
});

/// Lifecycle status of an individual stone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum StoneStatus {
    #[default]
    Available,
    Reserved,
    OnMemo,
    Sold,
    Damaged,
}

impl_enum_text!(StoneStatus, "status", {
    Available => "AVAILABLE",
    Reserved => "RESERVED",
    OnMemo => "ON_MEMO",
    Sold => "SOLD",
    Damaged => "DAMAGED",
});

/// Gemstone family, carried on stone profiles and parcels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum StoneType {
    Diamond,
    Ruby,
    Sapphire,
    Emerald,
    Pearl,
    Other,
}

impl_enum_text!(StoneType, "stoneType", {
    Diamond => "DIAMOND",
    Ruby => "RUBY",
    Sapphire => "SAPPHIRE",
    Emerald => "EMERALD",
    Pearl => "PEARL",
    Other => "OTHER",
});

/// Whether a stone profile describes rough or polished material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum FinishType {
    Rough,
    Polished,
}

impl_enum_text!(FinishType, "finishType", {
    Rough => "ROUGH",
    Polished => "POLISHED",
});

/// Kind of entry in a parcel's transaction history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum TransactionKind {
    Receive,
    Reserve,
    Release,
    Sale,
    Adjustment,
    Return,
}

impl_enum_text!(TransactionKind, "kind", {
    Receive => "RECEIVE",
    Reserve => "RESERVE",
    Release => "RELEASE",
    Sale => "SALE",
    Adjustment => "ADJUSTMENT",
    Return => "RETURN",
});

// =============================================================================
// Warehouse
// =============================================================================

/// A stock location owned by a shop (or by the system when `shop_id` is None).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Warehouse {
    pub id: String,
    pub shop_id: Option<String>,
    pub name: String,
    /// Unique per shop.
    pub code: String,
    #[serde(rename = "type")]
    pub warehouse_type: WarehouseType,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    /// At most one per shop.
    pub is_primary: bool,
    pub is_system: bool,
    #[ts(as = "Option<String>")]
    pub max_capacity: Option<Decimal>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Parcel
// =============================================================================

/// A tracked batch of stock within a warehouse.
///
/// ## Quantity State
/// ```text
/// ┌──────────────────────── totalQuantity ────────────────────────┐
/// │ available │ reserved │ (unaccounted: sold, lost, on memo ...)  │
/// └───────────┴──────────┴─────────────────────────────────────────┘
///   invariant: available + reserved <= totalQuantity, all >= 0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Parcel {
    pub id: String,
    pub warehouse_id: String,
    pub shop_id: Option<String>,
    pub variant_id: Option<String>,
    /// Caller-supplied, not guaranteed unique.
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
    #[ts(as = "String")]
    pub total_quantity: Decimal,
    #[ts(as = "String")]
    pub available: Decimal,
    #[ts(as = "String")]
    pub reserved: Decimal,
    #[ts(as = "Option<String>")]
    pub min_order_qty: Option<Decimal>,
    #[ts(as = "Option<String>")]
    pub cost_price: Option<Decimal>,
    #[ts(as = "Option<String>")]
    pub wholesale_price: Option<Decimal>,
    #[ts(as = "Option<String>")]
    pub retail_price: Option<Decimal>,
    pub status: ParcelStatus,
    pub sellable: bool,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub received_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Parcel {
    /// Returns true when the stored quantities satisfy the ledger invariant.
    ///
    /// Partial updates may leave a parcel outside the invariant, so readers
    /// that care must check.
    pub fn is_consistent(&self) -> bool {
        crate::ledger::check_quantities(self.total_quantity, self.available, self.reserved)
            .is_ok()
    }

    /// Returns true if stones may be registered against this parcel.
    #[inline]
    pub fn is_stone_tracked(&self) -> bool {
        self.tracking_mode == TrackingMode::Single
    }
}

// =============================================================================
// Stone
// =============================================================================

/// An individually measured unit belonging to a SINGLE-tracked parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Stone {
    pub id: String,
    pub parcel_id: String,
    pub stone_profile_id: String,
    pub stone_code: String,
    pub internal_ref: Option<String>,
    pub supplier_stone_ref: Option<String>,
    #[ts(as = "String")]
    pub carat: Decimal,
    #[ts(as = "Option<String>")]
    pub length: Option<Decimal>,
    #[ts(as = "Option<String>")]
    pub width: Option<Decimal>,
    #[ts(as = "Option<String>")]
    pub depth: Option<Decimal>,
    pub laser_inscription: Option<String>,
    pub certificate_number: Option<String>,
    pub certificate_issuer: Option<String>,
    #[ts(as = "Option<String>")]
    pub certificate_date: Option<NaiveDate>,
    pub certificate_url: Option<String>,
    #[ts(as = "Option<String>")]
    pub cost_price: Option<Decimal>,
    #[ts(as = "Option<String>")]
    pub wholesale_price: Option<Decimal>,
    #[ts(as = "Option<String>")]
    pub retail_price: Option<Decimal>,
    pub status: StoneStatus,
    pub bin_location: Option<String>,
    pub notes: Option<String>,
    pub images: Vec<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stone Profile
// =============================================================================

/// Shared grading attributes referenced by parcels and stones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StoneProfile {
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
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// User
// =============================================================================

/// A back-office account. Only counted by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Parcel Transaction
// =============================================================================

/// One entry of a parcel's append-only history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ParcelTransaction {
    pub id: String,
    pub parcel_id: String,
    pub kind: TransactionKind,
    #[ts(as = "String")]
    pub quantity: Decimal,
    pub reference: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_defaults() {
        assert_eq!(TrackingMode::default(), TrackingMode::Bulk);
        assert_eq!(ParcelStatus::default(), ParcelStatus::InStock);
        assert_eq!(StoneStatus::default(), StoneStatus::Available);
        assert_eq!(WarehouseType::default(), WarehouseType::Physical);
    }

    #[test]
    fn test_enum_text_round_trip() {
        for status in ParcelStatus::ALL {
            assert_eq!(status.as_str().parse::<ParcelStatus>().unwrap(), *status);
        }
        assert_eq!("single".parse::<TrackingMode>().unwrap(), TrackingMode::Single);
        assert_eq!(" carat ".parse::<StoneUnit>().unwrap(), StoneUnit::Carat);
    }

    #[test]
    fn test_unknown_enum_text_is_rejected() {
        let err = "BULKY".parse::<TrackingMode>().unwrap_err();
        assert!(err.to_string().contains("trackingMode"));
        assert!(err.to_string().contains("BULK, SINGLE"));
    }

    #[test]
    fn test_enum_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ParcelStatus::InStock).unwrap();
        assert_eq!(json, "\"IN_STOCK\"");

        let unit: StoneUnit = serde_json::from_str("\"PIECE\"").unwrap();
        assert_eq!(unit, StoneUnit::Piece);
    }
}
