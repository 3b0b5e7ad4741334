//! # Decimal Parsing
//!
//! Quantities, measurements and prices arrive as text and are parsed into
//! `rust_decimal::Decimal`. Nothing in the ledger goes through `f64`.
//!
//! ## Accepted Forms
//! ```text
//! "100"      → 100
//! "0.750"    → 0.750      (scale preserved)
//! " 12.5 "   → 12.5       (surrounding whitespace ignored)
//! "1e3"      → 1000       (scientific notation)
//! "12,5"     → InvalidDecimal
//! ""         → InvalidDecimal
//! ```

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};

/// Parses a decimal from text.
///
/// ## Errors
/// `CoreError::InvalidDecimal` carrying the field name and the raw text.
pub fn parse(field: &str, raw: &str) -> CoreResult<Decimal> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(CoreError::invalid_decimal(field, raw));
    }

    let parsed = if text.contains(['e', 'E']) {
        Decimal::from_scientific(text)
    } else {
        Decimal::from_str_exact(text)
    };

    parsed.map_err(|_| CoreError::invalid_decimal(field, raw))
}

/// Parses a decimal that must be zero or greater.
pub fn parse_non_negative(field: &str, raw: &str) -> CoreResult<Decimal> {
    let value = parse(field, raw)?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(CoreError::negative(field));
    }
    Ok(value)
}

/// Parses an optional decimal; `None` stays `None`.
pub fn parse_optional(field: &str, raw: Option<&str>) -> CoreResult<Option<Decimal>> {
    raw.map(|r| parse(field, r)).transpose()
}

/// Parses an optional decimal that must be zero or greater when present.
pub fn parse_optional_non_negative(field: &str, raw: Option<&str>) -> CoreResult<Option<Decimal>> {
    raw.map(|r| parse_non_negative(field, r)).transpose()
}

/// Parses a patch value: absent stays absent, explicit null clears.
pub fn parse_patch(
    field: &str,
    raw: Option<Option<String>>,
    non_negative: bool,
) -> CoreResult<Option<Option<Decimal>>> {
    match raw {
        None => Ok(None),
        Some(None) => Ok(Some(None)),
        Some(Some(text)) if non_negative => Ok(Some(Some(parse_non_negative(field, &text)?))),
        Some(Some(text)) => Ok(Some(Some(parse(field, &text)?))),
    }
}

/// Parses a decimal read back from the store.
///
/// Stored text is always canonical, so failure means a corrupted row. The
/// caller maps the error to its own "corrupt record" variant.
pub fn from_stored(field: &str, text: &str) -> CoreResult<Decimal> {
    Decimal::from_str(text).map_err(|_| CoreError::invalid_decimal(field, text))
}

/// Parses an optional stored decimal.
pub fn from_stored_opt(field: &str, text: Option<&str>) -> CoreResult<Option<Decimal>> {
    text.map(|t| from_stored(field, t)).transpose()
}

// =============================================================================
// Arithmetic
// =============================================================================

/// `a + b`, or `QuantityOverflow` naming `field` when the result leaves the
/// decimal range.
pub fn checked_add(field: &str, a: Decimal, b: Decimal) -> CoreResult<Decimal> {
    a.checked_add(b).ok_or_else(|| CoreError::overflow(field))
}

/// `a * b`, or `QuantityOverflow` naming `field`.
pub fn checked_mul(field: &str, a: Decimal, b: Decimal) -> CoreResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| CoreError::overflow(field))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_scale() {
        let value = parse("carat", "0.750").unwrap();
        assert_eq!(value, Decimal::new(750, 3));
        assert_eq!(value.to_string(), "0.750");
    }

    #[test]
    fn test_parse_trims_and_accepts_scientific() {
        assert_eq!(parse("totalQuantity", " 12.5 ").unwrap(), Decimal::new(125, 1));
        assert_eq!(parse("totalQuantity", "1e3").unwrap(), Decimal::new(1000, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for raw in ["", "  ", "12,5", "abc", "1.2.3"] {
            let err = parse("totalQuantity", raw).unwrap_err();
            assert!(
                matches!(err, CoreError::InvalidDecimal { ref field, .. } if field == "totalQuantity"),
                "expected InvalidDecimal for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_parse_non_negative() {
        assert_eq!(parse_non_negative("reserved", "0").unwrap(), Decimal::ZERO);
        assert_eq!(parse_non_negative("reserved", "-0").unwrap(), Decimal::ZERO);
        assert!(matches!(
            parse_non_negative("reserved", "-1"),
            Err(CoreError::NegativeQuantity { .. })
        ));
    }

    #[test]
    fn test_parse_patch_states() {
        assert_eq!(parse_patch("costPrice", None, true).unwrap(), None);
        assert_eq!(parse_patch("costPrice", Some(None), true).unwrap(), Some(None));
        assert_eq!(
            parse_patch("costPrice", Some(Some("9.99".into())), true).unwrap(),
            Some(Some(Decimal::new(999, 2)))
        );
        assert!(parse_patch("costPrice", Some(Some("-1".into())), true).is_err());
    }

    #[test]
    fn test_no_float_drift() {
        let a = parse("available", "0.1").unwrap();
        let b = parse("available", "0.2").unwrap();
        assert_eq!(a + b, parse("available", "0.3").unwrap());
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let max = parse("available", "79228162514264337593543950335").unwrap();
        assert_eq!(max, Decimal::MAX);

        let err = checked_add("totalAvailable", max, Decimal::ONE).unwrap_err();
        assert!(matches!(err, CoreError::QuantityOverflow { ref field } if field == "totalAvailable"));
        assert!(checked_mul("carat", max, Decimal::TWO).is_err());

        assert_eq!(checked_add("x", Decimal::ONE, Decimal::ONE).unwrap(), Decimal::TWO);
        assert_eq!(checked_mul("x", Decimal::TEN, Decimal::new(2, 1)).unwrap(), Decimal::TWO);
    }
}
