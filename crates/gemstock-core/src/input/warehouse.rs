//! Warehouse inputs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::nullable;
use crate::decimal;
use crate::error::CoreResult;
use crate::types::WarehouseType;
use crate::validation::{normalize_optional, required, validate_code, MAX_NAME_LEN};

/// Input for creating a warehouse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWarehouseInput {
    /// Empty or whitespace means "no shop" (system-level warehouse).
    pub shop_id: Option<String>,
    pub name: String,
    pub code: String,
    #[serde(rename = "type")]
    pub warehouse_type: Option<WarehouseType>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub is_primary: Option<bool>,
    pub is_system: Option<bool>,
    pub max_capacity: Option<String>,
    pub notes: Option<String>,
}

/// A validated warehouse ready for insertion. Defaults are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWarehouse {
    pub shop_id: Option<String>,
    pub name: String,
    pub code: String,
    pub warehouse_type: WarehouseType,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub is_primary: bool,
    pub is_system: bool,
    pub max_capacity: Option<Decimal>,
    pub notes: Option<String>,
}

impl CreateWarehouseInput {
    pub fn validate(self) -> CoreResult<NewWarehouse> {
        Ok(NewWarehouse {
            shop_id: normalize_optional(self.shop_id),
            name: required("name", &self.name, MAX_NAME_LEN)?,
            code: validate_code("code", &self.code)?,
            warehouse_type: self.warehouse_type.unwrap_or_default(),
            address: self.address,
            city: self.city,
            state: self.state,
            country: self.country,
            postal_code: self.postal_code,
            phone: self.phone,
            email: self.email,
            is_active: self.is_active.unwrap_or(true),
            is_primary: self.is_primary.unwrap_or(false),
            is_system: self.is_system.unwrap_or(false),
            max_capacity: decimal::parse_optional_non_negative(
                "maxCapacity",
                self.max_capacity.as_deref(),
            )?,
            notes: self.notes,
        })
    }
}

/// Partial warehouse update. See the module docs for absent/null semantics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWarehouseInput {
    #[serde(default, deserialize_with = "nullable")]
    pub shop_id: Option<Option<String>>,
    pub name: Option<String>,
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub warehouse_type: Option<WarehouseType>,
    #[serde(default, deserialize_with = "nullable")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub postal_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub email: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub is_primary: Option<bool>,
    pub is_system: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub max_capacity: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

/// A validated warehouse update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WarehousePatch {
    pub shop_id: Option<Option<String>>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub warehouse_type: Option<WarehouseType>,
    pub address: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub country: Option<Option<String>>,
    pub postal_code: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub is_primary: Option<bool>,
    pub is_system: Option<bool>,
    pub max_capacity: Option<Option<Decimal>>,
    pub notes: Option<Option<String>>,
}

impl UpdateWarehouseInput {
    pub fn validate(self) -> CoreResult<WarehousePatch> {
        Ok(WarehousePatch {
            shop_id: self.shop_id.map(normalize_optional),
            name: self
                .name
                .map(|n| required("name", &n, MAX_NAME_LEN))
                .transpose()?,
            code: self.code.map(|c| validate_code("code", &c)).transpose()?,
            warehouse_type: self.warehouse_type,
            address: self.address,
            city: self.city,
            state: self.state,
            country: self.country,
            postal_code: self.postal_code,
            phone: self.phone,
            email: self.email,
            is_active: self.is_active,
            is_primary: self.is_primary,
            is_system: self.is_system,
            max_capacity: decimal::parse_patch("maxCapacity", self.max_capacity, true)?,
            notes: self.notes,
        })
    }
}

/// Filter for listing warehouses. Provided fields are AND-combined.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseFilter {
    pub shop_id: Option<String>,
    pub is_active: Option<bool>,
    #[serde(rename = "type")]
    pub warehouse_type: Option<WarehouseType>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn input(name: &str, code: &str) -> CreateWarehouseInput {
        CreateWarehouseInput {
            name: name.to_string(),
            code: code.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_applies_defaults() {
        let new = input("Main Vault", "WH-MAIN").validate().unwrap();
        assert_eq!(new.warehouse_type, WarehouseType::Physical);
        assert!(new.is_active);
        assert!(!new.is_primary);
        assert!(!new.is_system);
        assert_eq!(new.shop_id, None);
    }

    #[test]
    fn test_create_normalizes_blank_shop() {
        let new = CreateWarehouseInput {
            shop_id: Some("   ".to_string()),
            ..input("Main Vault", "WH-MAIN")
        }
        .validate()
        .unwrap();
        assert_eq!(new.shop_id, None);
    }

    #[test]
    fn test_create_requires_name_and_code() {
        assert!(matches!(
            input("", "WH-1").validate(),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            input("Vault", "  ").validate(),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_create_parses_capacity() {
        let new = CreateWarehouseInput {
            max_capacity: Some("2500.50".to_string()),
            ..input("Vault", "WH-1")
        }
        .validate()
        .unwrap();
        assert_eq!(new.max_capacity, Some(Decimal::new(250050, 2)));

        let err = CreateWarehouseInput {
            max_capacity: Some("lots".to_string()),
            ..input("Vault", "WH-1")
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidDecimal { .. }));

        let err = CreateWarehouseInput {
            max_capacity: Some("-1".to_string()),
            ..input("Vault", "WH-1")
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, CoreError::NegativeQuantity { .. }));
    }

    #[test]
    fn test_update_from_json() {
        let update: UpdateWarehouseInput = serde_json::from_str(
            r#"{"isPrimary": true, "notes": null, "type": "VIRTUAL", "maxCapacity": "10"}"#,
        )
        .unwrap();
        let patch = update.validate().unwrap();

        assert_eq!(patch.is_primary, Some(true));
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.warehouse_type, Some(WarehouseType::Virtual));
        assert_eq!(patch.max_capacity, Some(Some(Decimal::new(10, 0))));
        assert_eq!(patch.name, None);
        assert_eq!(patch.address, None);
    }

    #[test]
    fn test_update_rejects_unknown_type() {
        let result: Result<UpdateWarehouseInput, _> =
            serde_json::from_str(r#"{"type": "FLOATING"}"#);
        assert!(result.is_err());
    }
}
