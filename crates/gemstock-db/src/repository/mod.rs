//! # Repository Module
//!
//! Database repository implementations for Gemstock.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Request → Repository → SQLite                       │
//! │                                                                         │
//! │  caller                                                                 │
//! │       │  db.parcels().update(id, UpdateParcelInput { .. })             │
//! │       ▼                                                                 │
//! │  ParcelRepository                                                      │
//! │  ├── input.validate()?          ← gemstock-core, no I/O                │
//! │  ├── BEGIN                                                              │
//! │  ├── load row → domain record   ← rows.rs (TEXT decimals → Decimal)    │
//! │  ├── ledger::apply_parcel_patch ← gemstock-core                        │
//! │  ├── write row, rows_affected() == 0 → NotFound                        │
//! │  └── COMMIT                                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inside a transaction every statement runs on `&mut *tx`. In-memory
//! databases have a single pooled connection, so going back to the pool there
//! would wait on the transaction itself.
//!
//! ## Available Repositories
//!
//! - [`WarehouseRepository`] - Warehouses, primary demotion, stock summary
//! - [`ParcelRepository`] - Parcel ledger and transaction history
//! - [`StoneRepository`] - Stones of SINGLE parcels, search, reconciliation
//! - [`AnalyticsRepository`] - Dashboard counters and timelines
//! - [`CatalogRepository`] - Shops, users, products, variants, stone profiles

pub mod analytics;
pub mod catalog;
pub mod parcel;
pub(crate) mod rows;
pub mod stone;
pub mod warehouse;

#[cfg(test)]
pub(crate) mod test_support;

pub use analytics::AnalyticsRepository;
pub use catalog::CatalogRepository;
pub use parcel::ParcelRepository;
pub use stone::StoneRepository;
pub use warehouse::WarehouseRepository;
