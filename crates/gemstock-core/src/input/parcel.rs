//! Parcel and parcel-transaction inputs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::nullable;
use crate::decimal;
use crate::error::CoreResult;
use crate::ledger::check_quantities;
use crate::types::{ParcelStatus, StoneType, StoneUnit, TrackingMode, TransactionKind};
use crate::validation::{normalize_optional, required, validate_code, MAX_CODE_LEN};

// =============================================================================
// Create
// =============================================================================

/// Input for creating a parcel. Decimal fields are text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParcelInput {
    pub warehouse_id: String,
    pub shop_id: Option<String>,
    pub variant_id: Option<String>,
    pub parcel_code: String,
    pub supplier_ref: Option<String>,
    pub tracking_mode: Option<TrackingMode>,
    pub stone_type: Option<StoneType>,
    pub stone_profile_id: Option<String>,
    pub origin: Option<String>,
    pub quality_grade: Option<String>,
    pub certification: Option<String>,
    pub parcel_report_ref: Option<String>,
    pub unit: StoneUnit,
    pub total_quantity: String,
    pub available: String,
    pub reserved: Option<String>,
    pub min_order_qty: Option<String>,
    pub cost_price: Option<String>,
    pub wholesale_price: Option<String>,
    pub retail_price: Option<String>,
    pub status: Option<ParcelStatus>,
    pub sellable: Option<bool>,
    pub notes: Option<String>,
    /// Defaults to the insertion time.
    pub received_at: Option<DateTime<Utc>>,
}

/// A validated parcel ready for insertion.
///
/// Quantities are non-negative and satisfy `available + reserved <= total`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewParcel {
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
    pub total_quantity: Decimal,
    pub available: Decimal,
    pub reserved: Decimal,
    pub min_order_qty: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub wholesale_price: Option<Decimal>,
    pub retail_price: Option<Decimal>,
    pub status: ParcelStatus,
    pub sellable: bool,
    pub notes: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
}

impl CreateParcelInput {
    pub fn validate(self) -> CoreResult<NewParcel> {
        let total_quantity = decimal::parse_non_negative("totalQuantity", &self.total_quantity)?;
        let available = decimal::parse_non_negative("available", &self.available)?;
        let reserved = decimal::parse_optional_non_negative("reserved", self.reserved.as_deref())?
            .unwrap_or(Decimal::ZERO);
        check_quantities(total_quantity, available, reserved)?;

        Ok(NewParcel {
            warehouse_id: required("warehouseId", &self.warehouse_id, MAX_CODE_LEN)?,
            shop_id: normalize_optional(self.shop_id),
            variant_id: normalize_optional(self.variant_id),
            parcel_code: validate_code("parcelCode", &self.parcel_code)?,
            supplier_ref: self.supplier_ref,
            tracking_mode: self.tracking_mode.unwrap_or_default(),
            stone_type: self.stone_type,
            stone_profile_id: normalize_optional(self.stone_profile_id),
            origin: self.origin,
            quality_grade: self.quality_grade,
            certification: self.certification,
            parcel_report_ref: self.parcel_report_ref,
            unit: self.unit,
            total_quantity,
            available,
            reserved,
            min_order_qty: decimal::parse_optional_non_negative(
                "minOrderQty",
                self.min_order_qty.as_deref(),
            )?,
            cost_price: decimal::parse_optional("costPrice", self.cost_price.as_deref())?,
            wholesale_price: decimal::parse_optional(
                "wholesalePrice",
                self.wholesale_price.as_deref(),
            )?,
            retail_price: decimal::parse_optional("retailPrice", self.retail_price.as_deref())?,
            status: self.status.unwrap_or_default(),
            sellable: self.sellable.unwrap_or(false),
            notes: self.notes,
            received_at: self.received_at,
        })
    }
}

// =============================================================================
// Update
// =============================================================================

/// Partial parcel update.
///
/// Setting `variantId` or `stoneProfileId` to null disconnects the relation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParcelInput {
    pub warehouse_id: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub shop_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub variant_id: Option<Option<String>>,
    pub parcel_code: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub supplier_ref: Option<Option<String>>,
    pub tracking_mode: Option<TrackingMode>,
    #[serde(default, deserialize_with = "nullable")]
    pub stone_type: Option<Option<StoneType>>,
    #[serde(default, deserialize_with = "nullable")]
    pub stone_profile_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub origin: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub quality_grade: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub certification: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub parcel_report_ref: Option<Option<String>>,
    pub unit: Option<StoneUnit>,
    pub total_quantity: Option<String>,
    pub available: Option<String>,
    pub reserved: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub min_order_qty: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub cost_price: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub wholesale_price: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub retail_price: Option<Option<String>>,
    pub status: Option<ParcelStatus>,
    pub sellable: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    pub received_at: Option<DateTime<Utc>>,
}

/// A validated parcel update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParcelPatch {
    pub warehouse_id: Option<String>,
    pub shop_id: Option<Option<String>>,
    pub variant_id: Option<Option<String>>,
    pub parcel_code: Option<String>,
    pub supplier_ref: Option<Option<String>>,
    pub tracking_mode: Option<TrackingMode>,
    pub stone_type: Option<Option<StoneType>>,
    pub stone_profile_id: Option<Option<String>>,
    pub origin: Option<Option<String>>,
    pub quality_grade: Option<Option<String>>,
    pub certification: Option<Option<String>>,
    pub parcel_report_ref: Option<Option<String>>,
    pub unit: Option<StoneUnit>,
    pub total_quantity: Option<Decimal>,
    pub available: Option<Decimal>,
    pub reserved: Option<Decimal>,
    pub min_order_qty: Option<Option<Decimal>>,
    pub cost_price: Option<Option<Decimal>>,
    pub wholesale_price: Option<Option<Decimal>>,
    pub retail_price: Option<Option<Decimal>>,
    pub status: Option<ParcelStatus>,
    pub sellable: Option<bool>,
    pub notes: Option<Option<String>>,
    pub received_at: Option<DateTime<Utc>>,
}

impl UpdateParcelInput {
    /// Validates the update.
    ///
    /// Supplied quantities must be non-negative. The sum rule is checked only
    /// when `totalQuantity`, `available` and `reserved` are all supplied; a
    /// partial quantity update is applied as given.
    pub fn validate(self) -> CoreResult<ParcelPatch> {
        let total_quantity = decimal::parse_optional_non_negative(
            "totalQuantity",
            self.total_quantity.as_deref(),
        )?;
        let available =
            decimal::parse_optional_non_negative("available", self.available.as_deref())?;
        let reserved = decimal::parse_optional_non_negative("reserved", self.reserved.as_deref())?;

        if let (Some(total), Some(available), Some(reserved)) = (total_quantity, available, reserved)
        {
            check_quantities(total, available, reserved)?;
        }

        Ok(ParcelPatch {
            warehouse_id: self
                .warehouse_id
                .map(|w| required("warehouseId", &w, MAX_CODE_LEN))
                .transpose()?,
            shop_id: self.shop_id.map(normalize_optional),
            variant_id: self.variant_id.map(normalize_optional),
            parcel_code: self
                .parcel_code
                .map(|c| validate_code("parcelCode", &c))
                .transpose()?,
            supplier_ref: self.supplier_ref,
            tracking_mode: self.tracking_mode,
            stone_type: self.stone_type,
            stone_profile_id: self.stone_profile_id.map(normalize_optional),
            origin: self.origin,
            quality_grade: self.quality_grade,
            certification: self.certification,
            parcel_report_ref: self.parcel_report_ref,
            unit: self.unit,
            total_quantity,
            available,
            reserved,
            min_order_qty: decimal::parse_patch("minOrderQty", self.min_order_qty, true)?,
            cost_price: decimal::parse_patch("costPrice", self.cost_price, false)?,
            wholesale_price: decimal::parse_patch("wholesalePrice", self.wholesale_price, false)?,
            retail_price: decimal::parse_patch("retailPrice", self.retail_price, false)?,
            status: self.status,
            sellable: self.sellable,
            notes: self.notes,
            received_at: self.received_at,
        })
    }
}

// =============================================================================
// Filter
// =============================================================================

/// Filter for listing parcels. Provided fields are AND-combined.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelFilter {
    pub shop_id: Option<String>,
    pub warehouse_id: Option<String>,
    pub status: Option<ParcelStatus>,
    pub variant_id: Option<String>,
    pub tracking_mode: Option<TrackingMode>,
    pub stone_type: Option<StoneType>,
}

// =============================================================================
// Transactions
// =============================================================================

/// Input for appending an entry to a parcel's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordTransactionInput {
    pub kind: TransactionKind,
    pub quantity: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// A validated history entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub quantity: Decimal,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl RecordTransactionInput {
    pub fn validate(self) -> CoreResult<NewTransaction> {
        Ok(NewTransaction {
            kind: self.kind,
            quantity: decimal::parse_non_negative("quantity", &self.quantity)?,
            reference: self.reference,
            notes: self.notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use serde_json::json;

    fn create_input(total: &str, available: &str, reserved: Option<&str>) -> CreateParcelInput {
        serde_json::from_value(json!({
            "warehouseId": "wh-1",
            "parcelCode": "PRC-001",
            "unit": "CARAT",
            "totalQuantity": total,
            "available": available,
            "reserved": reserved,
        }))
        .unwrap()
    }

    #[test]
    fn test_create_defaults() {
        let new = create_input("100", "100", None).validate().unwrap();
        assert_eq!(new.tracking_mode, TrackingMode::Bulk);
        assert_eq!(new.status, ParcelStatus::InStock);
        assert!(!new.sellable);
        assert_eq!(new.reserved, Decimal::ZERO);
        assert_eq!(new.total_quantity, Decimal::new(100, 0));
    }

    #[test]
    fn test_create_enforces_quantity_sum() {
        assert!(create_input("100", "70", Some("30")).validate().is_ok());

        let err = create_input("100", "80", Some("30")).validate().unwrap_err();
        assert!(matches!(err, CoreError::QuantityExceedsTotal { .. }));
    }

    #[test]
    fn test_create_rejects_negative_and_malformed_quantities() {
        let err = create_input("100", "-1", None).validate().unwrap_err();
        assert!(matches!(err, CoreError::NegativeQuantity { .. }));

        let err = create_input("1OO", "10", None).validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidDecimal { ref field, .. } if field == "totalQuantity"));
    }

    #[test]
    fn test_create_blank_shop_is_absent() {
        let mut input = create_input("5", "5", None);
        input.shop_id = Some(String::new());
        assert_eq!(input.validate().unwrap().shop_id, None);
    }

    #[test]
    fn test_update_partial_quantity_skips_sum_check() {
        let update: UpdateParcelInput = serde_json::from_value(json!({ "reserved": "30" })).unwrap();
        let patch = update.validate().unwrap();
        assert_eq!(patch.reserved, Some(Decimal::new(30, 0)));
        assert_eq!(patch.available, None);
    }

    #[test]
    fn test_update_full_quantity_checks_sum() {
        let update: UpdateParcelInput = serde_json::from_value(json!({
            "totalQuantity": "100",
            "available": "80",
            "reserved": "30",
        }))
        .unwrap();
        assert!(matches!(
            update.validate(),
            Err(CoreError::QuantityExceedsTotal { .. })
        ));
    }

    #[test]
    fn test_quantities_at_decimal_max_fail_cleanly() {
        const MAX: &str = "79228162514264337593543950335";

        assert!(create_input(MAX, MAX, None).validate().is_ok());

        let err = create_input(MAX, MAX, Some("1")).validate().unwrap_err();
        assert!(matches!(err, CoreError::QuantityExceedsTotal { .. }));

        let update: UpdateParcelInput = serde_json::from_value(json!({
            "totalQuantity": MAX,
            "available": MAX,
            "reserved": MAX,
        }))
        .unwrap();
        assert!(matches!(
            update.validate(),
            Err(CoreError::QuantityExceedsTotal { .. })
        ));
    }

    #[test]
    fn test_update_null_disconnects_relations() {
        let update: UpdateParcelInput = serde_json::from_value(json!({
            "variantId": null,
            "stoneProfileId": null,
            "retailPrice": null,
        }))
        .unwrap();
        let patch = update.validate().unwrap();
        assert_eq!(patch.variant_id, Some(None));
        assert_eq!(patch.stone_profile_id, Some(None));
        assert_eq!(patch.retail_price, Some(None));
        assert_eq!(patch.cost_price, None);
    }

    #[test]
    fn test_record_transaction_validation() {
        let input: RecordTransactionInput = serde_json::from_value(json!({
            "kind": "RECEIVE",
            "quantity": "12.5",
            "reference": "PO-77",
        }))
        .unwrap();
        let tx = input.validate().unwrap();
        assert_eq!(tx.kind, TransactionKind::Receive);
        assert_eq!(tx.quantity, Decimal::new(125, 1));

        let input: RecordTransactionInput =
            serde_json::from_value(json!({ "kind": "SALE", "quantity": "-2" })).unwrap();
        assert!(input.validate().is_err());
    }
}
