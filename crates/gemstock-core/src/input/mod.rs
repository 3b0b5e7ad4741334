//! # Caller Input
//!
//! Create/update/filter types built by the request layer, and their
//! validation into typed, ledger-ready values.
//!
//! ## Flow
//! ```text
//! camelCase JSON ──serde──► Create*/Update* (decimals as text)
//!                                  │
//!                                  │ .validate()
//!                                  ▼
//!                           New* / *Patch   (Decimal, enums, trimmed text)
//!                                  │
//!                                  ▼
//!                           gemstock-db repositories
//! ```
//!
//! ## Partial Updates
//! Update inputs distinguish three states for optional columns:
//!
//! | JSON                 | Rust                 | Effect          |
//! |----------------------|----------------------|-----------------|
//! | field absent         | `None`               | unchanged       |
//! | `"field": null`      | `Some(None)`         | cleared         |
//! | `"field": "value"`   | `Some(Some(value))`  | set             |

mod catalog;
mod parcel;
mod stone;
mod warehouse;

pub use catalog::*;
pub use parcel::*;
pub use stone::*;
pub use warehouse::*;

use serde::{Deserialize, Deserializer};

/// Deserializes a field that may be absent, null, or set.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]`; serde leaves
/// an absent field at its `None` default and this function wraps everything
/// else in `Some`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Applies a nullable patch value to a field.
pub(crate) fn patch<T>(target: &mut Option<T>, value: Option<Option<T>>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Builds the error field name for entry `index` of a batch.
pub(crate) fn indexed(prefix: Option<usize>, field: &str) -> String {
    match prefix {
        Some(i) => format!("stones[{}].{}", i, field),
        None => field.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "nullable")]
        notes: Option<Option<String>>,
    }

    #[test]
    fn test_nullable_three_states() {
        let absent: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.notes, None);

        let cleared: Probe = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(cleared.notes, Some(None));

        let set: Probe = serde_json::from_str(r#"{"notes": "fragile"}"#).unwrap();
        assert_eq!(set.notes, Some(Some("fragile".to_string())));
    }

    #[test]
    fn test_patch_helper() {
        let mut value = Some(1);
        patch(&mut value, None);
        assert_eq!(value, Some(1));
        patch(&mut value, Some(None));
        assert_eq!(value, None);
        patch(&mut value, Some(Some(7)));
        assert_eq!(value, Some(7));
    }
}
