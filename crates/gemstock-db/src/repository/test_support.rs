//! Fixtures shared by the repository tests.

use gemstock_core::input::{
    CreateParcelInput, CreateShopInput, CreateStoneProfileInput, CreateWarehouseInput, StoneFields,
};
use gemstock_core::{FinishType, Parcel, StoneType, StoneUnit, TrackingMode};

use crate::pool::{Database, DbConfig};

pub async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// Creates a shop and returns its id.
pub async fn shop(db: &Database, slug: &str) -> String {
    db.catalog()
        .create_shop(CreateShopInput {
            name: format!("Shop {}", slug),
            slug: slug.to_string(),
        })
        .await
        .unwrap()
        .id
}

pub fn warehouse_input(name: &str, code: &str) -> CreateWarehouseInput {
    CreateWarehouseInput {
        name: name.to_string(),
        code: code.to_string(),
        ..Default::default()
    }
}

/// Creates a warehouse without a shop and returns its id.
pub async fn warehouse(db: &Database, code: &str) -> String {
    db.warehouses()
        .create(warehouse_input(&format!("Vault {}", code), code))
        .await
        .unwrap()
        .warehouse
        .id
}

/// A BULK carat parcel with nothing reserved.
pub fn parcel_input(warehouse_id: &str, total: &str, available: &str) -> CreateParcelInput {
    CreateParcelInput {
        warehouse_id: warehouse_id.to_string(),
        shop_id: None,
        variant_id: None,
        parcel_code: "PRC-001".to_string(),
        supplier_ref: None,
        tracking_mode: None,
        stone_type: None,
        stone_profile_id: None,
        origin: None,
        quality_grade: None,
        certification: None,
        parcel_report_ref: None,
        unit: StoneUnit::Carat,
        total_quantity: total.to_string(),
        available: available.to_string(),
        reserved: None,
        min_order_qty: None,
        cost_price: None,
        wholesale_price: None,
        retail_price: None,
        status: None,
        sellable: None,
        notes: None,
        received_at: None,
    }
}

/// Creates a SINGLE parcel measured in `unit` with an empty stock.
pub async fn single_parcel(db: &Database, warehouse_id: &str, unit: StoneUnit, total: &str) -> Parcel {
    let mut input = parcel_input(warehouse_id, total, "0");
    input.tracking_mode = Some(TrackingMode::Single);
    input.unit = unit;
    db.parcels().create(input).await.unwrap().parcel
}

/// Creates a polished diamond profile and returns its id.
pub async fn profile(db: &Database) -> String {
    db.catalog()
        .create_stone_profile(CreateStoneProfileInput::new(
            StoneType::Diamond,
            FinishType::Polished,
        ))
        .await
        .unwrap()
        .id
}

pub fn stone_fields(code: &str, carat: &str) -> StoneFields {
    StoneFields {
        stone_code: code.to_string(),
        carat: carat.to_string(),
        ..Default::default()
    }
}
