//! # Validation Module
//!
//! String and date validators shared by the input types.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request layer (out of scope)                                 │
//! │  └── Shape checks, sanitization                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: gemstock-core                                                │
//! │  ├── Closed enums (deserialization)                                    │
//! │  ├── THIS MODULE: required text, codes, dates                          │
//! │  └── ledger: quantity invariants                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (shop_id, code), one primary per shop                      │
//! │  └── Foreign key constraints with cascades                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of names (warehouse, shop, product).
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of codes (warehouse code, parcel code, stone code, SKU).
pub const MAX_CODE_LEN: usize = 64;

// =============================================================================
// String Validators
// =============================================================================

/// Validates that a text field is present after trimming.
///
/// ## Returns
/// The trimmed value.
pub fn required(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates a code (warehouse code, parcel code, stone code).
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_CODE_LEN`] characters
/// - Letters, digits, `-`, `_`, `.` and `/` only
///
/// ## Example
/// ```rust
/// use gemstock_core::validation::validate_code;
///
/// assert_eq!(validate_code("code", " WH-MAIN ").unwrap(), "WH-MAIN");
/// assert!(validate_code("code", "").is_err());
/// assert!(validate_code("code", "WH MAIN").is_err());
/// ```
pub fn validate_code(field: &str, value: &str) -> ValidationResult<String> {
    let code = required(field, value, MAX_CODE_LEN)?;

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, '-', '_', '.' and '/'".to_string(),
        });
    }

    Ok(code)
}

/// Validates a shop slug: lowercase letters, digits and hyphens.
pub fn validate_slug(value: &str) -> ValidationResult<String> {
    let slug = required("slug", value, MAX_CODE_LEN)?;

    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "slug".to_string(),
            reason: "must contain only lowercase letters, numbers and hyphens".to_string(),
        });
    }

    Ok(slug)
}

/// Normalizes optional free text: empty or whitespace-only becomes `None`.
///
/// Used for shop IDs on warehouses and parcels, where `""` means "no shop".
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

// =============================================================================
// Date Validators
// =============================================================================

/// Parses a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("expected YYYY-MM-DD, got '{}'", value),
        }
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        assert_eq!(required("name", "  Main Vault ", MAX_NAME_LEN).unwrap(), "Main Vault");
        assert!(matches!(
            required("name", "   ", MAX_NAME_LEN),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            required("name", &"x".repeat(MAX_NAME_LEN + 1), MAX_NAME_LEN),
            Err(ValidationError::TooLong { max: MAX_NAME_LEN, .. })
        ));
    }

    #[test]
    fn test_validate_code() {
        assert!(validate_code("parcelCode", "PRC-2024/001").is_ok());
        assert!(validate_code("parcelCode", "DIA_0.50").is_ok());
        assert!(validate_code("parcelCode", "bad code!").is_err());
    }

    #[test]
    fn test_validate_slug() {
        assert_eq!(validate_slug("aurora-gems").unwrap(), "aurora-gems");
        assert!(validate_slug("Aurora Gems").is_err());
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(None), None);
        assert_eq!(normalize_optional(Some(String::new())), None);
        assert_eq!(normalize_optional(Some("   ".to_string())), None);
        assert_eq!(
            normalize_optional(Some(" shop-1 ".to_string())),
            Some("shop-1".to_string())
        );
    }

    #[test]
    fn test_parse_date() {
        let date = parse_date("certificateDate", "2024-03-15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());

        assert!(parse_date("certificateDate", "15/03/2024").is_err());
        assert!(parse_date("certificateDate", "2024-02-30").is_err());
    }
}
