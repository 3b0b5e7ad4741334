//! # Error Types
//!
//! Domain-specific error types for gemstock-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gemstock-core errors (this file)                                      │
//! │  ├── CoreError        - Ledger rule violations, malformed decimals     │
//! │  └── ValidationError  - Input shape failures                           │
//! │                                                                         │
//! │  gemstock-db errors (separate crate)                                   │
//! │  └── DbError          - NotFound / Conflict / InvalidInput / store     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError::InvalidInput → caller    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, value, parcel ID)
//! 3. Errors are enum variants, never String

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::TrackingMode;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger rule violations and malformed input that reached the core.
///
/// Every variant is an "invalid input" from the caller's point of view: the
/// request layer should have prevented it, but the ledger refuses to store it.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A decimal field could not be parsed.
    ///
    /// ## When This Occurs
    /// - `"12,5"` or `"abc"` supplied as a quantity
    /// - A value outside the 96-bit decimal range
    #[error("{field} is not a valid decimal: '{value}'")]
    InvalidDecimal { field: String, value: String },

    /// A quantity or measurement was negative.
    #[error("{field} must not be negative")]
    NegativeQuantity { field: String },

    /// `available + reserved` would exceed `totalQuantity`.
    ///
    /// ## User Workflow
    /// ```text
    /// Update parcel (total: 100, available: 80, reserved: 30)
    ///      │
    ///      ▼
    /// 80 + 30 = 110 > 100
    ///      │
    ///      ▼
    /// QuantityExceedsTotal { available: 80, reserved: 30, total: 100 }
    /// ```
    #[error("available ({available}) + reserved ({reserved}) exceeds total quantity ({total})")]
    QuantityExceedsTotal {
        available: Decimal,
        reserved: Decimal,
        total: Decimal,
    },

    /// A sum or product left the 96-bit decimal range.
    ///
    /// ## When This Occurs
    /// - Summing quantities close to `Decimal::MAX` in a stock summary
    /// - Reconciling stones whose carats add up past the decimal range
    #[error("{field} is out of the supported decimal range")]
    QuantityOverflow { field: String },

    /// A stone operation targeted a parcel that is not stone-tracked.
    #[error("Parcel {parcel_id} uses {mode} tracking, operation requires SINGLE")]
    TrackingModeMismatch {
        parcel_id: String,
        mode: TrackingMode,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidDecimal error for a field and its raw text.
    pub fn invalid_decimal(field: impl Into<String>, value: impl Into<String>) -> Self {
        CoreError::InvalidDecimal {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a QuantityOverflow error.
    pub fn overflow(field: impl Into<String>) -> Self {
        CoreError::QuantityOverflow {
            field: field.into(),
        }
    }

    /// Creates a NegativeQuantity error.
    pub fn negative(field: impl Into<String>) -> Self {
        CoreError::NegativeQuantity {
            field: field.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet shape requirements.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value must be zero or greater.
    #[error("{field} must be zero or greater")]
    MustBeNonNegative { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::QuantityExceedsTotal {
            available: Decimal::new(80, 0),
            reserved: Decimal::new(30, 0),
            total: Decimal::new(100, 0),
        };
        assert_eq!(
            err.to_string(),
            "available (80) + reserved (30) exceeds total quantity (100)"
        );

        let err = CoreError::TrackingModeMismatch {
            parcel_id: "p-1".to_string(),
            mode: TrackingMode::Bulk,
        };
        assert_eq!(
            err.to_string(),
            "Parcel p-1 uses BULK tracking, operation requires SINGLE"
        );
    }

    #[test]
    fn test_decimal_error_keeps_raw_text() {
        let err = CoreError::invalid_decimal("totalQuantity", "12,5");
        assert_eq!(err.to_string(), "totalQuantity is not a valid decimal: '12,5'");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "parcelCode".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
