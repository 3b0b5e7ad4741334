//! # gemstock-db: Database Layer for Gemstock
//!
//! This crate provides persistence for the Gemstock inventory ledger. It uses
//! SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Gemstock Data Flow                               │
//! │                                                                         │
//! │  Request layer (CreateParcelInput, UpdateWarehouseInput, ...)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   gemstock-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ WarehouseRepo  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ParcelRepo     │    │ 001_initial  │  │   │
//! │  │   │ WAL, FKs on   │    │ StoneRepo      │    │   _schema    │  │   │
//! │  │   │               │    │ AnalyticsRepo  │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   config.rs (AppConfig)      logging.rs (init_tracing)         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/gemstock/gemstock.db (Linux default)           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`config`] - TOML + environment configuration for binaries
//! - [`logging`] - Tracing subscriber setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gemstock_db::{AppConfig, Database};
//!
//! let config = AppConfig::load(None)?;
//! gemstock_db::logging::init_tracing(&config.logging);
//!
//! let db = Database::new(config.db_config()).await?;
//! let summary = db.warehouses().stock_summary(&warehouse_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod logging;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{AppConfig, ConfigError};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    AnalyticsRepository, CatalogRepository, ParcelRepository, StoneRepository,
    WarehouseRepository,
};
