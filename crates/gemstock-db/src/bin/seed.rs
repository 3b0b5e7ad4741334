//! # Seed Data Generator
//!
//! Populates a database with a small demo inventory for development.
//!
//! ## Usage
//! ```bash
//! # Use gemstock.toml / GEMSTOCK_* environment settings
//! cargo run -p gemstock-db --bin seed
//!
//! # Specify database path
//! cargo run -p gemstock-db --bin seed -- --db ./gemstock_dev.db
//!
//! # Specify config file
//! cargo run -p gemstock-db --bin seed -- --config ./gemstock.toml
//! ```
//!
//! ## Generated Data
//! - One shop with a primary and a secondary warehouse
//! - Diamond and ruby stone profiles, a product with one variant
//! - A BULK melee parcel with a receive transaction
//! - Two SINGLE parcels (CARAT and PIECE) with certified stones, reconciled
//!   from their stones

use std::env;
use std::path::PathBuf;

use gemstock_core::input::{
    BulkCreateStonesInput, CreateParcelInput, CreateProductInput, CreateShopInput,
    CreateStoneProfileInput, CreateUserInput, CreateVariantInput, CreateWarehouseInput,
    RecordTransactionInput, StoneFields, WarehouseFilter,
};
use gemstock_core::{
    FinishType, ParcelStatus, StoneType, StoneUnit, TimelineKind, TrackingMode, TransactionKind,
};
use gemstock_db::logging::init_tracing;
use gemstock_db::{AppConfig, Database};
use tracing::info;

/// Certified round brilliants: (code, carat, certificate, retail price).
const DIAMONDS: &[(&str, &str, &str, &str)] = &[
    ("RB-0001", "0.52", "GIA-2231874401", "1850.00"),
    ("RB-0002", "0.71", "GIA-2231874402", "3420.00"),
    ("RB-0003", "1.01", "GIA-2231874403", "7900.00"),
    ("RB-0004", "1.20", "GIA-2231874404", "9650.00"),
    ("RB-0005", "0.90", "GIA-2231874405", "5100.00"),
];

/// Cabochon rubies: (code, carat, retail price).
const RUBIES: &[(&str, &str, &str)] = &[
    ("RC-01", "2.15", "2600.00"),
    ("RC-02", "1.84", "2250.00"),
    ("RC-03", "3.02", "4100.00"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Gemstock Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -d, --db <PATH>      Database file path (overrides config)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = AppConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }
    init_tracing(&config.logging);

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    println!("Gemstock Seed Data Generator");
    println!("============================");
    println!("Database: {}", config.database.path.display());
    println!();

    let db = Database::new(config.db_config()).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.warehouses().find_all(&WarehouseFilter::default()).await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} warehouses", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    let shop = db
        .catalog()
        .create_shop(CreateShopInput {
            name: "Aurora Fine Jewelry".into(),
            slug: "aurora".into(),
        })
        .await?;

    db.catalog()
        .create_user(CreateUserInput {
            email: "manager@aurora.example".into(),
            name: "Store Manager".into(),
        })
        .await?;

    let diamond = db
        .catalog()
        .create_stone_profile(CreateStoneProfileInput {
            shape: Some("Round".into()),
            color: Some("G".into()),
            clarity: Some("VS1".into()),
            cut: Some("Excellent".into()),
            ..CreateStoneProfileInput::new(StoneType::Diamond, FinishType::Polished)
        })
        .await?;

    let ruby = db
        .catalog()
        .create_stone_profile(CreateStoneProfileInput {
            shape: Some("Oval Cabochon".into()),
            origin: Some("Mozambique".into()),
            treatment: Some("Heated".into()),
            ..CreateStoneProfileInput::new(StoneType::Ruby, FinishType::Polished)
        })
        .await?;

    let product = db
        .catalog()
        .create_product(CreateProductInput {
            name: "Pavé Eternity Band".into(),
        })
        .await?;
    let variant = db
        .catalog()
        .create_variant(CreateVariantInput {
            product_id: product.id.clone(),
            sku: "PAVE-BAND-18K".into(),
        })
        .await?;

    println!("✓ Catalog: shop '{}', 2 stone profiles, 1 variant", shop.slug);

    // -------------------------------------------------------------------------
    // Warehouses
    // -------------------------------------------------------------------------

    let vault = db
        .warehouses()
        .create(CreateWarehouseInput {
            shop_id: Some(shop.id.clone()),
            name: "Main Vault".into(),
            code: "VAULT-01".into(),
            city: Some("Antwerp".into()),
            country: Some("BE".into()),
            is_primary: Some(true),
            max_capacity: Some("5000".into()),
            ..Default::default()
        })
        .await?
        .warehouse;

    let showroom = db
        .warehouses()
        .create(CreateWarehouseInput {
            shop_id: Some(shop.id.clone()),
            name: "Showroom Safe".into(),
            code: "SHOW-01".into(),
            ..Default::default()
        })
        .await?
        .warehouse;

    println!("✓ Warehouses: {} (primary), {}", vault.code, showroom.code);

    // -------------------------------------------------------------------------
    // Parcels
    // -------------------------------------------------------------------------

    let melee = db
        .parcels()
        .create(CreateParcelInput {
            variant_id: Some(variant.id.clone()),
            stone_type: Some(StoneType::Diamond),
            stone_profile_id: Some(diamond.id.clone()),
            total_quantity: "250".into(),
            available: "220".into(),
            reserved: Some("30".into()),
            cost_price: Some("41250.00".into()),
            retail_price: Some("87500.00".into()),
            sellable: Some(true),
            ..parcel(&vault.id, &shop.id, "MEL-2026-01", TrackingMode::Bulk, StoneUnit::Carat)
        })
        .await?
        .parcel;

    db.parcels()
        .record_transaction(
            &melee.id,
            RecordTransactionInput {
                kind: TransactionKind::Receive,
                quantity: "250".into(),
                reference: Some("PO-7781".into()),
                notes: None,
            },
        )
        .await?;

    let certified = db
        .parcels()
        .create(CreateParcelInput {
            stone_type: Some(StoneType::Diamond),
            stone_profile_id: Some(diamond.id.clone()),
            total_quantity: "4.34".into(),
            ..parcel(&vault.id, &shop.id, "CERT-2026-01", TrackingMode::Single, StoneUnit::Carat)
        })
        .await?
        .parcel;

    let cabochons = db
        .parcels()
        .create(CreateParcelInput {
            stone_type: Some(StoneType::Ruby),
            stone_profile_id: Some(ruby.id.clone()),
            total_quantity: "3".into(),
            status: Some(ParcelStatus::OnMemo),
            ..parcel(&showroom.id, &shop.id, "RUBY-2026-01", TrackingMode::Single, StoneUnit::Piece)
        })
        .await?
        .parcel;

    db.stones()
        .bulk_create(BulkCreateStonesInput {
            parcel_id: certified.id.clone(),
            stone_profile_id: diamond.id.clone(),
            stones: DIAMONDS
                .iter()
                .map(|(code, carat, cert, price)| StoneFields {
                    stone_code: code.to_string(),
                    carat: carat.to_string(),
                    certificate_number: Some(cert.to_string()),
                    certificate_issuer: Some("GIA".into()),
                    certificate_date: Some("2025-09-18".into()),
                    retail_price: Some(price.to_string()),
                    ..Default::default()
                })
                .collect(),
        })
        .await?;

    db.stones()
        .bulk_create(BulkCreateStonesInput {
            parcel_id: cabochons.id.clone(),
            stone_profile_id: ruby.id.clone(),
            stones: RUBIES
                .iter()
                .map(|(code, carat, price)| StoneFields {
                    stone_code: code.to_string(),
                    carat: carat.to_string(),
                    retail_price: Some(price.to_string()),
                    bin_location: Some("TRAY-B".into()),
                    ..Default::default()
                })
                .collect(),
        })
        .await?;

    for parcel_id in [&certified.id, &cabochons.id] {
        let reconciled = db.stones().reconcile_parcel(parcel_id).await?;
        info!(
            parcel = %reconciled.parcel_code,
            available = %reconciled.available,
            unit = %reconciled.unit,
            "Seed parcel reconciled"
        );
    }

    println!("✓ Parcels: 1 BULK, 2 SINGLE with {} stones", DIAMONDS.len() + RUBIES.len());

    // -------------------------------------------------------------------------
    // Report
    // -------------------------------------------------------------------------

    println!();
    for warehouse in [&vault, &showroom] {
        let summary = db.warehouses().stock_summary(&warehouse.id).await?;
        println!(
            "{}: {} parcels, available {}, reserved {}",
            warehouse.code, summary.total_parcels, summary.total_available, summary.total_reserved
        );
        for (unit, bucket) in &summary.by_unit {
            println!("  {:<6} {} parcels, available {}", unit, bucket.count, bucket.available);
        }
    }

    let stats = db.analytics().dashboard_stats().await?;
    let today = db.analytics().timeline(TimelineKind::Parcels).await?;
    println!();
    println!(
        "Dashboard: {} users, {} warehouses, {} parcels, in-stock value {}",
        stats.users.total, stats.warehouses.total, stats.parcels.total, stats.parcels.total_value
    );
    println!(
        "Parcels created today: {}",
        today.last().map(|p| p.count).unwrap_or(0)
    );

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// A parcel skeleton with empty stock; callers fill in quantities.
fn parcel(
    warehouse_id: &str,
    shop_id: &str,
    code: &str,
    mode: TrackingMode,
    unit: StoneUnit,
) -> CreateParcelInput {
    CreateParcelInput {
        warehouse_id: warehouse_id.to_string(),
        shop_id: Some(shop_id.to_string()),
        variant_id: None,
        parcel_code: code.to_string(),
        supplier_ref: None,
        tracking_mode: Some(mode),
        stone_type: None,
        stone_profile_id: None,
        origin: None,
        quality_grade: None,
        certification: None,
        parcel_report_ref: None,
        unit,
        total_quantity: "0".into(),
        available: "0".into(),
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
