//! # gemstock-core: Pure Ledger Logic for Gemstock
//!
//! This crate holds the inventory-quantity ledger rules as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Gemstock Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Request Layer (out of scope)                    │   │
//! │  │     builds input::Create*/Update* from camelCase JSON           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ gemstock-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │ decimal │ │  input  │ │ ledger  │ │ summary │  │   │
//! │  │   │ Parcel  │ │ parsing │ │ Create* │ │ qty     │ │ Stock   │  │   │
//! │  │   │ Stone   │ │         │ │ Update* │ │ rules   │ │ Timeline│  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  gemstock-db (Database Layer)                   │   │
//! │  │          SQLite repositories, transactions, migrations          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records and closed enums (Warehouse, Parcel, Stone, ...)
//! - [`views`] - Joined read models returned by the repositories
//! - [`decimal`] - Exact decimal parsing for quantities and prices
//! - [`input`] - Caller-facing create/update/filter types and their validation
//! - [`ledger`] - Quantity invariants, patch application, stone reconciliation
//! - [`summary`] - Stock summaries, dashboard stats, daily timelines
//! - [`validation`] - String and date validators
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Exact Decimals**: quantities and prices are `rust_decimal::Decimal`, never floats
//! 2. **No I/O**: the caller supplies "now" and "today" where time matters
//! 3. **Closed Enums**: statuses, units and modes are validated at the boundary
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use gemstock_core::ledger::check_quantities;
//! use rust_decimal::Decimal;
//!
//! let total = Decimal::new(100, 0);
//! assert!(check_quantities(total, Decimal::new(70, 0), Decimal::new(30, 0)).is_ok());
//! assert!(check_quantities(total, Decimal::new(80, 0), Decimal::new(30, 0)).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod decimal;
pub mod error;
pub mod input;
pub mod ledger;
pub mod summary;
pub mod types;
pub mod validation;
pub mod views;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use summary::{DashboardStats, StockSummary, TimelineKind, TimelinePoint};
pub use types::*;
pub use views::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of AVAILABLE stones embedded in a parcel view after create/update.
pub const AVAILABLE_STONE_PREVIEW_LIMIT: i64 = 10;

/// Number of transactions embedded in a parcel detail view.
pub const RECENT_TRANSACTION_LIMIT: i64 = 10;

/// Days before "today" covered by a timeline. The window is inclusive on both
/// ends, so a timeline always has `TIMELINE_WINDOW_DAYS + 1` points.
pub const TIMELINE_WINDOW_DAYS: i64 = 30;
