//! Stone inputs: single create, batch create, update and query.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{indexed, nullable};
use crate::decimal;
use crate::error::CoreResult;
use crate::types::{Stone, StoneStatus, StoneType};
use crate::validation::{parse_date, required, validate_code, MAX_CODE_LEN};

// =============================================================================
// Create
// =============================================================================

/// Per-stone fields shared by single and batch creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoneFields {
    pub stone_code: String,
    pub internal_ref: Option<String>,
    pub supplier_stone_ref: Option<String>,
    pub carat: String,
    pub length: Option<String>,
    pub width: Option<String>,
    pub depth: Option<String>,
    pub laser_inscription: Option<String>,
    pub certificate_number: Option<String>,
    pub certificate_issuer: Option<String>,
    /// `YYYY-MM-DD`.
    pub certificate_date: Option<String>,
    pub certificate_url: Option<String>,
    pub cost_price: Option<String>,
    pub wholesale_price: Option<String>,
    pub retail_price: Option<String>,
    pub status: Option<StoneStatus>,
    pub bin_location: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Input for registering one stone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoneInput {
    pub parcel_id: String,
    pub stone_profile_id: String,
    #[serde(flatten)]
    pub stone: StoneFields,
}

/// Input for registering many stones against one parcel and profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateStonesInput {
    pub parcel_id: String,
    pub stone_profile_id: String,
    pub stones: Vec<StoneFields>,
}

/// A validated stone ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStone {
    pub parcel_id: String,
    pub stone_profile_id: String,
    pub stone_code: String,
    pub internal_ref: Option<String>,
    pub supplier_stone_ref: Option<String>,
    pub carat: Decimal,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub depth: Option<Decimal>,
    pub laser_inscription: Option<String>,
    pub certificate_number: Option<String>,
    pub certificate_issuer: Option<String>,
    pub certificate_date: Option<NaiveDate>,
    pub certificate_url: Option<String>,
    pub cost_price: Option<Decimal>,
    pub wholesale_price: Option<Decimal>,
    pub retail_price: Option<Decimal>,
    pub status: StoneStatus,
    pub bin_location: Option<String>,
    pub notes: Option<String>,
    pub images: Vec<String>,
}

impl StoneFields {
    /// Validates one stone. `index` names the batch position in errors.
    fn validate(
        self,
        parcel_id: &str,
        stone_profile_id: &str,
        index: Option<usize>,
    ) -> CoreResult<NewStone> {
        let f = |name: &str| indexed(index, name);

        Ok(NewStone {
            parcel_id: parcel_id.to_string(),
            stone_profile_id: stone_profile_id.to_string(),
            stone_code: validate_code(&f("stoneCode"), &self.stone_code)?,
            internal_ref: self.internal_ref,
            supplier_stone_ref: self.supplier_stone_ref,
            carat: decimal::parse_non_negative(&f("carat"), &self.carat)?,
            length: decimal::parse_optional_non_negative(&f("length"), self.length.as_deref())?,
            width: decimal::parse_optional_non_negative(&f("width"), self.width.as_deref())?,
            depth: decimal::parse_optional_non_negative(&f("depth"), self.depth.as_deref())?,
            laser_inscription: self.laser_inscription,
            certificate_number: self.certificate_number,
            certificate_issuer: self.certificate_issuer,
            certificate_date: self
                .certificate_date
                .map(|d| parse_date(&f("certificateDate"), &d))
                .transpose()?,
            certificate_url: self.certificate_url,
            cost_price: decimal::parse_optional(&f("costPrice"), self.cost_price.as_deref())?,
            wholesale_price: decimal::parse_optional(
                &f("wholesalePrice"),
                self.wholesale_price.as_deref(),
            )?,
            retail_price: decimal::parse_optional(&f("retailPrice"), self.retail_price.as_deref())?,
            status: self.status.unwrap_or_default(),
            bin_location: self.bin_location,
            notes: self.notes,
            images: self.images,
        })
    }
}

impl CreateStoneInput {
    pub fn validate(self) -> CoreResult<NewStone> {
        let parcel_id = required("parcelId", &self.parcel_id, MAX_CODE_LEN)?;
        let profile_id = required("stoneProfileId", &self.stone_profile_id, MAX_CODE_LEN)?;
        self.stone.validate(&parcel_id, &profile_id, None)
    }
}

impl BulkCreateStonesInput {
    /// Validates every entry. The first failure aborts the whole batch.
    pub fn validate(self) -> CoreResult<Vec<NewStone>> {
        let parcel_id = required("parcelId", &self.parcel_id, MAX_CODE_LEN)?;
        let profile_id = required("stoneProfileId", &self.stone_profile_id, MAX_CODE_LEN)?;

        self.stones
            .into_iter()
            .enumerate()
            .map(|(i, stone)| stone.validate(&parcel_id, &profile_id, Some(i)))
            .collect()
    }
}

// =============================================================================
// Update
// =============================================================================

/// Partial stone update. A stone cannot move between parcels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoneInput {
    pub stone_profile_id: Option<String>,
    pub stone_code: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub internal_ref: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub supplier_stone_ref: Option<Option<String>>,
    pub carat: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub length: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub width: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub depth: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub laser_inscription: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub certificate_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub certificate_issuer: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub certificate_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub certificate_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub cost_price: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub wholesale_price: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub retail_price: Option<Option<String>>,
    pub status: Option<StoneStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub bin_location: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    pub images: Option<Vec<String>>,
}

/// A validated stone update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StonePatch {
    pub stone_profile_id: Option<String>,
    pub stone_code: Option<String>,
    pub internal_ref: Option<Option<String>>,
    pub supplier_stone_ref: Option<Option<String>>,
    pub carat: Option<Decimal>,
    pub length: Option<Option<Decimal>>,
    pub width: Option<Option<Decimal>>,
    pub depth: Option<Option<Decimal>>,
    pub laser_inscription: Option<Option<String>>,
    pub certificate_number: Option<Option<String>>,
    pub certificate_issuer: Option<Option<String>>,
    pub certificate_date: Option<Option<NaiveDate>>,
    pub certificate_url: Option<Option<String>>,
    pub cost_price: Option<Option<Decimal>>,
    pub wholesale_price: Option<Option<Decimal>>,
    pub retail_price: Option<Option<Decimal>>,
    pub status: Option<StoneStatus>,
    pub bin_location: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub images: Option<Vec<String>>,
}

impl UpdateStoneInput {
    pub fn validate(self) -> CoreResult<StonePatch> {
        let certificate_date = match self.certificate_date {
            None => None,
            Some(None) => Some(None),
            Some(Some(text)) => Some(Some(parse_date("certificateDate", &text)?)),
        };

        Ok(StonePatch {
            stone_profile_id: self
                .stone_profile_id
                .map(|p| required("stoneProfileId", &p, MAX_CODE_LEN))
                .transpose()?,
            stone_code: self
                .stone_code
                .map(|c| validate_code("stoneCode", &c))
                .transpose()?,
            internal_ref: self.internal_ref,
            supplier_stone_ref: self.supplier_stone_ref,
            carat: decimal::parse_optional_non_negative("carat", self.carat.as_deref())?,
            length: decimal::parse_patch("length", self.length, true)?,
            width: decimal::parse_patch("width", self.width, true)?,
            depth: decimal::parse_patch("depth", self.depth, true)?,
            laser_inscription: self.laser_inscription,
            certificate_number: self.certificate_number,
            certificate_issuer: self.certificate_issuer,
            certificate_date,
            certificate_url: self.certificate_url,
            cost_price: decimal::parse_patch("costPrice", self.cost_price, false)?,
            wholesale_price: decimal::parse_patch("wholesalePrice", self.wholesale_price, false)?,
            retail_price: decimal::parse_patch("retailPrice", self.retail_price, false)?,
            status: self.status,
            bin_location: self.bin_location,
            notes: self.notes,
            images: self.images,
        })
    }
}

// =============================================================================
// Query
// =============================================================================

/// Stone search criteria. Range bounds are inclusive decimals as text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoneQuery {
    pub stone_type: Option<StoneType>,
    pub status: Option<StoneStatus>,
    pub parcel_id: Option<String>,
    pub warehouse_id: Option<String>,
    pub certificate_number: Option<String>,
    pub min_carat: Option<String>,
    pub max_carat: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

/// A validated stone query.
///
/// Equality criteria are pushed to SQL; decimal ranges are applied in Rust by
/// [`StoneFilter::matches_ranges`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoneFilter {
    pub stone_type: Option<StoneType>,
    pub status: Option<StoneStatus>,
    pub parcel_id: Option<String>,
    pub warehouse_id: Option<String>,
    pub certificate_number: Option<String>,
    pub min_carat: Option<Decimal>,
    pub max_carat: Option<Decimal>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl StoneQuery {
    pub fn validate(self) -> CoreResult<StoneFilter> {
        Ok(StoneFilter {
            stone_type: self.stone_type,
            status: self.status,
            parcel_id: self.parcel_id,
            warehouse_id: self.warehouse_id,
            certificate_number: self.certificate_number,
            min_carat: decimal::parse_optional("minCarat", self.min_carat.as_deref())?,
            max_carat: decimal::parse_optional("maxCarat", self.max_carat.as_deref())?,
            min_price: decimal::parse_optional("minPrice", self.min_price.as_deref())?,
            max_price: decimal::parse_optional("maxPrice", self.max_price.as_deref())?,
        })
    }
}

impl StoneFilter {
    /// Returns true when the stone satisfies every carat and price bound.
    ///
    /// A stone without a retail price never matches a price bound.
    pub fn matches_ranges(&self, stone: &Stone) -> bool {
        let carat_ok = self.min_carat.map_or(true, |min| stone.carat >= min)
            && self.max_carat.map_or(true, |max| stone.carat <= max);

        let price_bounded = self.min_price.is_some() || self.max_price.is_some();
        let price_ok = match (price_bounded, stone.retail_price) {
            (false, _) => true,
            (true, None) => false,
            (true, Some(price)) => {
                self.min_price.map_or(true, |min| price >= min)
                    && self.max_price.map_or(true, |max| price <= max)
            }
        };

        carat_ok && price_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use chrono::Utc;
    use serde_json::json;

    fn fields(code: &str, carat: &str) -> StoneFields {
        StoneFields {
            stone_code: code.to_string(),
            carat: carat.to_string(),
            ..Default::default()
        }
    }

    fn stone(carat: i64, scale: u32, retail: Option<Decimal>) -> Stone {
        let now = Utc::now();
        Stone {
            id: "s-1".into(),
            parcel_id: "p-1".into(),
            stone_profile_id: "sp-1".into(),
            stone_code: "D-1".into(),
            internal_ref: None,
            supplier_stone_ref: None,
            carat: Decimal::new(carat, scale),
            length: None,
            width: None,
            depth: None,
            laser_inscription: None,
            certificate_number: None,
            certificate_issuer: None,
            certificate_date: None,
            certificate_url: None,
            cost_price: None,
            wholesale_price: None,
            retail_price: retail,
            status: StoneStatus::Available,
            bin_location: None,
            notes: None,
            images: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_create_from_flattened_json() {
        let input: CreateStoneInput = serde_json::from_value(json!({
            "parcelId": "p-1",
            "stoneProfileId": "sp-1",
            "stoneCode": "D-0001",
            "carat": "1.01",
            "certificateNumber": "GIA-2141438171",
            "certificateDate": "2023-11-02",
        }))
        .unwrap();

        let new = input.validate().unwrap();
        assert_eq!(new.parcel_id, "p-1");
        assert_eq!(new.carat, Decimal::new(101, 2));
        assert_eq!(new.status, StoneStatus::Available);
        assert_eq!(new.certificate_date, NaiveDate::from_ymd_opt(2023, 11, 2));
        assert!(new.images.is_empty());
    }

    #[test]
    fn test_bulk_inherits_parcel_and_profile() {
        let batch = BulkCreateStonesInput {
            parcel_id: "p-9".into(),
            stone_profile_id: "sp-3".into(),
            stones: vec![fields("A-1", "0.5"), fields("A-2", "0.75")],
        };
        let stones = batch.validate().unwrap();
        assert_eq!(stones.len(), 2);
        assert!(stones
            .iter()
            .all(|s| s.parcel_id == "p-9" && s.stone_profile_id == "sp-3"));
    }

    #[test]
    fn test_bulk_error_names_entry() {
        let batch = BulkCreateStonesInput {
            parcel_id: "p-9".into(),
            stone_profile_id: "sp-3".into(),
            stones: vec![fields("A-1", "0.5"), fields("A-2", "heavy")],
        };
        let err = batch.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidDecimal { ref field, .. } if field == "stones[1].carat"));
    }

    #[test]
    fn test_bad_certificate_date() {
        let input = CreateStoneInput {
            parcel_id: "p-1".into(),
            stone_profile_id: "sp-1".into(),
            stone: StoneFields {
                certificate_date: Some("02/11/2023".into()),
                ..fields("D-1", "1")
            },
        };
        assert!(matches!(input.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_filter_carat_range_is_inclusive() {
        let filter = StoneQuery {
            min_carat: Some("0.50".into()),
            max_carat: Some("1.00".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert!(filter.matches_ranges(&stone(50, 2, None)));
        assert!(filter.matches_ranges(&stone(1, 0, None)));
        assert!(!filter.matches_ranges(&stone(49, 2, None)));
        assert!(!filter.matches_ranges(&stone(101, 2, None)));
    }

    #[test]
    fn test_filter_price_excludes_unpriced() {
        let filter = StoneQuery {
            min_price: Some("1000".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert!(!filter.matches_ranges(&stone(1, 0, None)));
        assert!(filter.matches_ranges(&stone(1, 0, Some(Decimal::new(1500, 0)))));
        assert!(!filter.matches_ranges(&stone(1, 0, Some(Decimal::new(999, 0)))));

        let unbounded = StoneFilter::default();
        assert!(unbounded.matches_ranges(&stone(1, 0, None)));
    }
}
