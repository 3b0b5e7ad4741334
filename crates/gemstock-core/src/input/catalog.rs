//! Catalog inputs: shops, users, products, variants and stone profiles.

use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ValidationError};
use crate::types::{FinishType, StoneType};
use crate::validation::{required, validate_code, validate_slug, MAX_NAME_LEN};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShopInput {
    pub name: String,
    pub slug: String,
}

impl CreateShopInput {
    pub fn validate(self) -> CoreResult<Self> {
        Ok(Self {
            name: required("name", &self.name, MAX_NAME_LEN)?,
            slug: validate_slug(&self.slug)?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    pub email: String,
    pub name: String,
}

impl CreateUserInput {
    /// Trims both fields and lowercases the email.
    pub fn validate(self) -> CoreResult<Self> {
        let email = required("email", &self.email, MAX_NAME_LEN)?.to_lowercase();
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(ValidationError::InvalidFormat {
                field: "email".to_string(),
                reason: "must look like name@domain".to_string(),
            }
            .into());
        }

        Ok(Self {
            email,
            name: required("name", &self.name, MAX_NAME_LEN)?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductInput {
    pub name: String,
}

impl CreateProductInput {
    pub fn validate(self) -> CoreResult<Self> {
        Ok(Self {
            name: required("name", &self.name, MAX_NAME_LEN)?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVariantInput {
    pub product_id: String,
    pub sku: String,
}

impl CreateVariantInput {
    pub fn validate(self) -> CoreResult<Self> {
        Ok(Self {
            product_id: required("productId", &self.product_id, MAX_NAME_LEN)?,
            sku: validate_code("sku", &self.sku)?,
        })
    }
}

/// Grading attributes for a new stone profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoneProfileInput {
    pub stone_type: StoneType,
    pub shape: Option<String>,
    pub finish_type: FinishType,
    pub color: Option<String>,
    pub clarity: Option<String>,
    pub cut: Option<String>,
    pub polish: Option<String>,
    pub symmetry: Option<String>,
    pub fluorescence: Option<String>,
    pub treatment: Option<String>,
    pub origin: Option<String>,
}

impl CreateStoneProfileInput {
    /// A profile with only the required attributes set.
    pub fn new(stone_type: StoneType, finish_type: FinishType) -> Self {
        Self {
            stone_type,
            shape: None,
            finish_type,
            color: None,
            clarity: None,
            cut: None,
            polish: None,
            symmetry: None,
            fluorescence: None,
            treatment: None,
            origin: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shop_slug_rules() {
        let shop = CreateShopInput {
            name: " Aurora Gems ".into(),
            slug: "aurora-gems".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(shop.name, "Aurora Gems");

        assert!(CreateShopInput {
            name: "Aurora".into(),
            slug: "Aurora Gems".into(),
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_user_email() {
        let user = CreateUserInput {
            email: " Owner@Aurora.example ".into(),
            name: "Owner".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(user.email, "owner@aurora.example");

        assert!(CreateUserInput {
            email: "owner".into(),
            name: "Owner".into(),
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_stone_profile_from_json() {
        let profile: CreateStoneProfileInput = serde_json::from_str(
            r#"{"stoneType": "RUBY", "finishType": "POLISHED", "origin": "Burma"}"#,
        )
        .unwrap();
        assert_eq!(profile.stone_type, StoneType::Ruby);
        assert_eq!(profile.origin.as_deref(), Some("Burma"));
    }
}
