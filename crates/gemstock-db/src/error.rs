//! # Database Error Types
//!
//! Error types for repository operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  CoreError (ledger rule)        sqlx::Error (store failure)            │
//! │       │                                │                                │
//! │       ▼                                ▼                                │
//! │  DbError::InvalidInput          DbError::{UniqueViolation, ...}        │
//! │       │                                │                                │
//! │       └───────────────┬────────────────┘                                │
//! │                       ▼                                                 │
//! │  Request layer maps NotFound → 404, InvalidInput → 400, Conflict → 409 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use gemstock_core::CoreError;
use thiserror::Error;

/// Repository operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - ID doesn't exist
    /// - Row deleted concurrently between the existence check and the write
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The operation conflicts with current state.
    ///
    /// ## When This Occurs
    /// - Deleting a warehouse that still holds parcels
    #[error("{0}")]
    Conflict(String),

    /// Input rejected by a ledger rule.
    ///
    /// ## When This Occurs
    /// - Malformed decimal text
    /// - `available + reserved > totalQuantity`
    /// - Stone operation on a BULK parcel
    #[error(transparent)]
    InvalidInput(#[from] CoreError),

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate warehouse code within a shop
    /// - Second primary warehouse for a shop (partial unique index)
    /// - Duplicate shop slug, user email or variant SKU
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a non-existent shop, variant or stone profile
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A stored row could not be decoded into a domain value.
    ///
    /// ## When This Occurs
    /// - Decimal column holding non-decimal text
    /// - Images column holding invalid JSON
    #[error("Corrupt {entity} record {id}: {reason}")]
    CorruptRecord {
        entity: String,
        id: String,
        reason: String,
    },

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a CorruptRecord error.
    pub fn corrupt(
        entity: impl Into<String>,
        id: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        DbError::CorruptRecord {
            entity: entity.into(),
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true for errors the caller should report as "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite reports "UNIQUE constraint failed: <table>.<column>[, ...]"
                // and "FOREIGN KEY constraint failed".
                if let Some(columns) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: columns.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<gemstock_core::ValidationError> for DbError {
    fn from(err: gemstock_core::ValidationError) -> Self {
        DbError::InvalidInput(err.into())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
