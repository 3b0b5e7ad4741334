//! # Ledger Rules
//!
//! Quantity invariants, partial-update application and stone reconciliation.
//!
//! ## Quantity Invariant
//! ```text
//! available >= 0, reserved >= 0, total >= 0
//! available + reserved <= total
//! ```
//!
//! Creation always checks the full invariant. Updates check it only when all
//! three quantities arrive together (see `UpdateParcelInput::validate`).
//!
//! ## Reconciliation
//! A SINGLE parcel's quantities may drift from its stones because stone
//! mutations never touch the parcel. [`reconcile`] recomputes them:
//!
//! ```text
//! ┌──────────┬────────────────────────────────────────────┐
//! │ unit     │ contribution of one stone                  │
//! ├──────────┼────────────────────────────────────────────┤
//! │ CARAT    │ carat                                      │
//! │ GRAM     │ carat × 0.2                                │
//! │ PIECE    │ 1                                          │
//! └──────────┴────────────────────────────────────────────┘
//! AVAILABLE stones → available     RESERVED stones → reserved
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::decimal::{checked_add, checked_mul};
use crate::error::{CoreError, CoreResult};
use crate::input::{patch, ParcelPatch, StonePatch, WarehousePatch};
use crate::types::{Parcel, Stone, StoneStatus, StoneUnit, TrackingMode, Warehouse};

/// One metric carat is 0.2 grams.
pub const GRAMS_PER_CARAT: Decimal = Decimal::from_parts(2, 0, 0, false, 1);

// =============================================================================
// Quantity Invariant
// =============================================================================

/// Checks the parcel quantity invariant.
///
/// ## Errors
/// - `NegativeQuantity` naming the first negative field
/// - `QuantityExceedsTotal` when `available + reserved > total`, including
///   when the sum itself leaves the decimal range
pub fn check_quantities(total: Decimal, available: Decimal, reserved: Decimal) -> CoreResult<()> {
    for (field, value) in [
        ("totalQuantity", total),
        ("available", available),
        ("reserved", reserved),
    ] {
        if value < Decimal::ZERO {
            return Err(CoreError::negative(field));
        }
    }

    let exceeds = match available.checked_add(reserved) {
        Some(sum) => sum > total,
        None => true,
    };

    if exceeds {
        return Err(CoreError::QuantityExceedsTotal {
            available,
            reserved,
            total,
        });
    }

    Ok(())
}

/// Fails unless the parcel is SINGLE-tracked.
pub fn require_single(parcel: &Parcel) -> CoreResult<()> {
    match parcel.tracking_mode {
        TrackingMode::Single => Ok(()),
        mode => Err(CoreError::TrackingModeMismatch {
            parcel_id: parcel.id.clone(),
            mode,
        }),
    }
}

// =============================================================================
// Patch Application
// =============================================================================

/// Applies a validated warehouse update and bumps `updated_at`.
pub fn apply_warehouse_patch(w: &mut Warehouse, p: WarehousePatch, now: DateTime<Utc>) {
    patch(&mut w.shop_id, p.shop_id);
    if let Some(name) = p.name {
        w.name = name;
    }
    if let Some(code) = p.code {
        w.code = code;
    }
    if let Some(t) = p.warehouse_type {
        w.warehouse_type = t;
    }
    patch(&mut w.address, p.address);
    patch(&mut w.city, p.city);
    patch(&mut w.state, p.state);
    patch(&mut w.country, p.country);
    patch(&mut w.postal_code, p.postal_code);
    patch(&mut w.phone, p.phone);
    patch(&mut w.email, p.email);
    if let Some(v) = p.is_active {
        w.is_active = v;
    }
    if let Some(v) = p.is_primary {
        w.is_primary = v;
    }
    if let Some(v) = p.is_system {
        w.is_system = v;
    }
    patch(&mut w.max_capacity, p.max_capacity);
    patch(&mut w.notes, p.notes);
    w.updated_at = now;
}

/// Applies a validated parcel update and bumps `updated_at`.
///
/// Quantities are written as supplied. The patch was validated on its own, so
/// a partial quantity change can leave the parcel outside the invariant.
pub fn apply_parcel_patch(parcel: &mut Parcel, p: ParcelPatch, now: DateTime<Utc>) {
    if let Some(id) = p.warehouse_id {
        parcel.warehouse_id = id;
    }
    patch(&mut parcel.shop_id, p.shop_id);
    patch(&mut parcel.variant_id, p.variant_id);
    if let Some(code) = p.parcel_code {
        parcel.parcel_code = code;
    }
    patch(&mut parcel.supplier_ref, p.supplier_ref);
    if let Some(mode) = p.tracking_mode {
        parcel.tracking_mode = mode;
    }
    patch(&mut parcel.stone_type, p.stone_type);
    patch(&mut parcel.stone_profile_id, p.stone_profile_id);
    patch(&mut parcel.origin, p.origin);
    patch(&mut parcel.quality_grade, p.quality_grade);
    patch(&mut parcel.certification, p.certification);
    patch(&mut parcel.parcel_report_ref, p.parcel_report_ref);
    if let Some(unit) = p.unit {
        parcel.unit = unit;
    }
    if let Some(total) = p.total_quantity {
        parcel.total_quantity = total;
    }
    if let Some(available) = p.available {
        parcel.available = available;
    }
    if let Some(reserved) = p.reserved {
        parcel.reserved = reserved;
    }
    patch(&mut parcel.min_order_qty, p.min_order_qty);
    patch(&mut parcel.cost_price, p.cost_price);
    patch(&mut parcel.wholesale_price, p.wholesale_price);
    patch(&mut parcel.retail_price, p.retail_price);
    if let Some(status) = p.status {
        parcel.status = status;
    }
    if let Some(sellable) = p.sellable {
        parcel.sellable = sellable;
    }
    patch(&mut parcel.notes, p.notes);
    if let Some(at) = p.received_at {
        parcel.received_at = at;
    }
    parcel.updated_at = now;
}

/// Applies a validated stone update and bumps `updated_at`.
pub fn apply_stone_patch(stone: &mut Stone, p: StonePatch, now: DateTime<Utc>) {
    if let Some(id) = p.stone_profile_id {
        stone.stone_profile_id = id;
    }
    if let Some(code) = p.stone_code {
        stone.stone_code = code;
    }
    patch(&mut stone.internal_ref, p.internal_ref);
    patch(&mut stone.supplier_stone_ref, p.supplier_stone_ref);
    if let Some(carat) = p.carat {
        stone.carat = carat;
    }
    patch(&mut stone.length, p.length);
    patch(&mut stone.width, p.width);
    patch(&mut stone.depth, p.depth);
    patch(&mut stone.laser_inscription, p.laser_inscription);
    patch(&mut stone.certificate_number, p.certificate_number);
    patch(&mut stone.certificate_issuer, p.certificate_issuer);
    patch(&mut stone.certificate_date, p.certificate_date);
    patch(&mut stone.certificate_url, p.certificate_url);
    patch(&mut stone.cost_price, p.cost_price);
    patch(&mut stone.wholesale_price, p.wholesale_price);
    patch(&mut stone.retail_price, p.retail_price);
    if let Some(status) = p.status {
        stone.status = status;
    }
    patch(&mut stone.bin_location, p.bin_location);
    patch(&mut stone.notes, p.notes);
    if let Some(images) = p.images {
        stone.images = images;
    }
    stone.updated_at = now;
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Quantities recomputed from a parcel's stones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub available: Decimal,
    pub reserved: Decimal,
}

/// How much one stone contributes to a parcel measured in `unit`.
pub fn stone_measure(unit: StoneUnit, stone: &Stone) -> CoreResult<Decimal> {
    match unit {
        StoneUnit::Carat => Ok(stone.carat),
        StoneUnit::Gram => checked_mul("carat", stone.carat, GRAMS_PER_CARAT),
        StoneUnit::Piece => Ok(Decimal::ONE),
    }
}

/// Recomputes `available` and `reserved` of a SINGLE parcel from its stones.
///
/// Stones in other statuses (on memo, sold, damaged) count toward neither.
///
/// ## Errors
/// - `TrackingModeMismatch` for BULK parcels
/// - `QuantityExceedsTotal` when the stones outweigh the parcel's total
/// - `QuantityOverflow` when the stones sum past the decimal range
pub fn reconcile(parcel: &Parcel, stones: &[Stone]) -> CoreResult<Reconciliation> {
    require_single(parcel)?;

    let mut result = Reconciliation {
        available: Decimal::ZERO,
        reserved: Decimal::ZERO,
    };

    for stone in stones.iter().filter(|s| s.parcel_id == parcel.id) {
        let measure = stone_measure(parcel.unit, stone)?;
        match stone.status {
            StoneStatus::Available => {
                result.available = checked_add("available", result.available, measure)?;
            }
            StoneStatus::Reserved => {
                result.reserved = checked_add("reserved", result.reserved, measure)?;
            }
            StoneStatus::OnMemo | StoneStatus::Sold | StoneStatus::Damaged => {}
        }
    }

    check_quantities(parcel.total_quantity, result.available, result.reserved)?;
    Ok(result)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParcelStatus;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn parcel(mode: TrackingMode, unit: StoneUnit, total: &str) -> Parcel {
        let now = Utc::now();
        Parcel {
            id: "p-1".into(),
            warehouse_id: "wh-1".into(),
            shop_id: None,
            variant_id: None,
            parcel_code: "PRC-1".into(),
            supplier_ref: None,
            tracking_mode: mode,
            stone_type: None,
            stone_profile_id: None,
            origin: None,
            quality_grade: None,
            certification: None,
            parcel_report_ref: None,
            unit,
            total_quantity: d(total),
            available: d(total),
            reserved: Decimal::ZERO,
            min_order_qty: None,
            cost_price: None,
            wholesale_price: None,
            retail_price: None,
            status: ParcelStatus::InStock,
            sellable: false,
            notes: None,
            received_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    fn stone(code: &str, carat: &str, status: StoneStatus) -> Stone {
        let now = Utc::now();
        Stone {
            id: format!("s-{}", code),
            parcel_id: "p-1".into(),
            stone_profile_id: "sp-1".into(),
            stone_code: code.into(),
            internal_ref: None,
            supplier_stone_ref: None,
            carat: d(carat),
            length: None,
            width: None,
            depth: None,
            laser_inscription: None,
            certificate_number: None,
            certificate_issuer: None,
            certificate_date: None,
            certificate_url: None,
            cost_price: None,
            wholesale_price: None,
            retail_price: None,
            status,
            bin_location: None,
            notes: None,
            images: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_check_quantities() {
        assert!(check_quantities(d("100"), d("100"), d("0")).is_ok());
        assert!(check_quantities(d("100"), d("70"), d("30")).is_ok());
        assert!(check_quantities(d("0"), d("0"), d("0")).is_ok());

        let err = check_quantities(d("100"), d("70.01"), d("30")).unwrap_err();
        assert!(matches!(err, CoreError::QuantityExceedsTotal { .. }));

        let err = check_quantities(d("100"), d("-1"), d("0")).unwrap_err();
        assert!(matches!(err, CoreError::NegativeQuantity { ref field } if field == "available"));
    }

    #[test]
    fn test_partial_reserved_patch_leaves_available() {
        let mut p = parcel(TrackingMode::Bulk, StoneUnit::Carat, "100");
        let patch = ParcelPatch {
            reserved: Some(d("30")),
            ..Default::default()
        };
        apply_parcel_patch(&mut p, patch, Utc::now());

        assert_eq!(p.available, d("100"));
        assert_eq!(p.reserved, d("30"));
        assert!(!p.is_consistent());
    }

    #[test]
    fn test_parcel_patch_clears_relations() {
        let mut p = parcel(TrackingMode::Bulk, StoneUnit::Carat, "10");
        p.variant_id = Some("v-1".into());
        p.notes = Some("keep".into());

        let patch = ParcelPatch {
            variant_id: Some(None),
            ..Default::default()
        };
        apply_parcel_patch(&mut p, patch, Utc::now());

        assert_eq!(p.variant_id, None);
        assert_eq!(p.notes.as_deref(), Some("keep"));
    }

    #[test]
    fn test_require_single() {
        let bulk = parcel(TrackingMode::Bulk, StoneUnit::Carat, "10");
        assert!(matches!(
            require_single(&bulk),
            Err(CoreError::TrackingModeMismatch {
                mode: TrackingMode::Bulk,
                ..
            })
        ));
        assert!(require_single(&parcel(TrackingMode::Single, StoneUnit::Carat, "10")).is_ok());
    }

    #[test]
    fn test_reconcile_carat() {
        let p = parcel(TrackingMode::Single, StoneUnit::Carat, "5");
        let stones = vec![
            stone("A", "1.01", StoneStatus::Available),
            stone("B", "0.75", StoneStatus::Available),
            stone("C", "0.50", StoneStatus::Reserved),
            stone("D", "2.00", StoneStatus::Sold),
        ];
        let r = reconcile(&p, &stones).unwrap();
        assert_eq!(r.available, d("1.76"));
        assert_eq!(r.reserved, d("0.50"));
    }

    #[test]
    fn test_reconcile_gram_and_piece() {
        let stones = vec![
            stone("A", "1.5", StoneStatus::Available),
            stone("B", "1.0", StoneStatus::Reserved),
        ];

        let grams = reconcile(&parcel(TrackingMode::Single, StoneUnit::Gram, "1"), &stones).unwrap();
        assert_eq!(grams.available, d("0.30"));
        assert_eq!(grams.reserved, d("0.20"));

        let pieces =
            reconcile(&parcel(TrackingMode::Single, StoneUnit::Piece, "2"), &stones).unwrap();
        assert_eq!(pieces.available, d("1"));
        assert_eq!(pieces.reserved, d("1"));
    }

    #[test]
    fn test_reconcile_rejects_overflow_and_bulk() {
        let stones = vec![stone("A", "3", StoneStatus::Available)];
        assert!(matches!(
            reconcile(&parcel(TrackingMode::Single, StoneUnit::Carat, "2"), &stones),
            Err(CoreError::QuantityExceedsTotal { .. })
        ));
        assert!(matches!(
            reconcile(&parcel(TrackingMode::Bulk, StoneUnit::Carat, "10"), &stones),
            Err(CoreError::TrackingModeMismatch { .. })
        ));
    }

    #[test]
    fn test_check_quantities_near_decimal_max() {
        let max = Decimal::MAX;
        assert!(check_quantities(max, max, d("0")).is_ok());

        let err = check_quantities(max, max, d("1")).unwrap_err();
        assert!(matches!(err, CoreError::QuantityExceedsTotal { .. }));
    }

    #[test]
    fn test_reconcile_reports_sum_overflow() {
        let p = parcel(TrackingMode::Single, StoneUnit::Carat, "1");
        let mut huge = stone("A", "1", StoneStatus::Available);
        huge.carat = Decimal::MAX;
        let mut more = stone("B", "1", StoneStatus::Available);
        more.carat = Decimal::MAX;

        let err = reconcile(&p, &[huge, more]).unwrap_err();
        assert!(matches!(err, CoreError::QuantityOverflow { ref field } if field == "available"));
    }

    #[test]
    fn test_grams_per_carat() {
        assert_eq!(GRAMS_PER_CARAT, d("0.2"));
    }
}
