//! # Transfer Rows Module
//!
//! File-shaped row types for bulk import and export.
//!
//! ## Row Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Row Lifecycle                                    │
//! │                                                                         │
//! │   IMPORT                                                                │
//! │   file bytes ──► serde (csv/json/xml) ──► ProductRow / BranchRow       │
//! │                                               │                         │
//! │                          to_product() / to_branch()                     │
//! │                          (normalize + validate, Err = skip row)         │
//! │                                               ▼                         │
//! │                                     Product / Branch entity             │
//! │                                                                         │
//! │   EXPORT                                                                │
//! │   Product / Branch entity ──► from_entity() ──► row ──► serde ──► file  │
//! │                               (canonical wire text, byte-stable)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tolerance Rules
//!
//! Rows are deliberately loose: every field is optional on the wire, key
//! casing varies between producers, and the price cell may arrive as text
//! or as a bare number. All of that is absorbed HERE so the reconciliation
//! engine only ever sees clean entities.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::ValidationResult;
use crate::normalize::{format_date, format_flag, normalize_optional, parse_date, parse_flag};
use crate::price::Price;
use crate::types::{Assignment, Branch, Product};
use crate::validation::{
    validate_branch_name, validate_price_cents, validate_product_name, validate_telephone,
};

// =============================================================================
// RawPrice - Price Cell As It Appears On The Wire
// =============================================================================

/// A price cell exactly as a file carried it, before interpretation.
///
/// ## Why A Sum Type
///
/// CSV cells are text, JSON producers emit either `"15.5"` or `15.5`, and
/// a missing cell means "no price given". Collapsing those three shapes
/// into one type at the parse boundary means the rest of the pipeline
/// resolves a price exactly once, in exactly one place ([`RawPrice::resolve`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RawPrice {
    /// The cell was missing entirely.
    #[default]
    Absent,
    /// The cell carried text (possibly blank, possibly garbage).
    Text(String),
    /// The cell carried a bare number (JSON producers do this).
    Number(f64),
}

impl RawPrice {
    /// Resolves the wire value to a concrete [`Price`].
    ///
    /// Absent and unparsable text both normalize to zero; lenient parsing
    /// rules live in [`Price::parse_lenient`].
    pub fn resolve(&self) -> Price {
        match self {
            RawPrice::Absent => Price::ZERO,
            RawPrice::Text(raw) => Price::parse_lenient(raw),
            RawPrice::Number(value) => Price::from_f64(*value),
        }
    }

    /// Canonical text form used on export ("0.##" trimming).
    pub fn to_wire_text(&self) -> String {
        self.resolve().to_wire()
    }
}

impl Serialize for RawPrice {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_wire_text())
    }
}

impl<'de> Deserialize<'de> for RawPrice {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RawPriceVisitor;

        impl<'de> Visitor<'de> for RawPriceVisitor {
            type Value = RawPrice;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a price as text or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RawPrice, E> {
                Ok(RawPrice::Text(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<RawPrice, E> {
                Ok(RawPrice::Text(v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<RawPrice, E> {
                Ok(RawPrice::Number(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawPrice, E> {
                Ok(RawPrice::Number(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawPrice, E> {
                Ok(RawPrice::Number(v as f64))
            }

            fn visit_unit<E: de::Error>(self) -> Result<RawPrice, E> {
                Ok(RawPrice::Absent)
            }

            fn visit_none<E: de::Error>(self) -> Result<RawPrice, E> {
                Ok(RawPrice::Absent)
            }

            fn visit_some<D2>(self, deserializer: D2) -> Result<RawPrice, D2::Error>
            where
                D2: Deserializer<'de>,
            {
                deserializer.deserialize_any(RawPriceVisitor)
            }

            // XML deserializers present a leaf element as a map whose text
            // content sits under the "$text" key. An empty element has no
            // entries and stays Absent.
            fn visit_map<A>(self, mut map: A) -> Result<RawPrice, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut price = RawPrice::Absent;
                while let Some(key) = map.next_key::<String>()? {
                    if key == "$text" {
                        price = map.next_value::<RawPrice>()?;
                    } else {
                        map.next_value::<de::IgnoredAny>()?;
                    }
                }
                Ok(price)
            }
        }

        deserializer.deserialize_any(RawPriceVisitor)
    }
}

// =============================================================================
// ProductRow
// =============================================================================

/// A product as carried by a transfer file.
///
/// ## Wire Shape
/// ```text
/// CSV:  ID,Name,WeightedItem,SuggestedSellingPrice
/// JSON: {"ID": 3, "name": "Milk 2L", "WeightedItem": "Y", "SuggestedSellingPrice": 15.5}
/// XML:  <Product><ID>3</ID><Name>Milk 2L</Name>...</Product>
/// ```
///
/// Key casing is tolerated via serde aliases; every field defaults when
/// missing so a sparse row still deserializes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    #[serde(rename = "ID", alias = "Id", alias = "id", default)]
    pub id: i64,

    #[serde(rename = "Name", alias = "NAME", alias = "name", default)]
    pub name: String,

    /// Flag text: `y`, `Y`, `1`, `true` mean weighted; everything else does not.
    #[serde(
        rename = "WeightedItem",
        alias = "weightedItem",
        alias = "weighteditem",
        alias = "weighted_item",
        alias = "Weighted",
        alias = "weighted",
        default
    )]
    pub weighted: String,

    #[serde(
        rename = "SuggestedSellingPrice",
        alias = "suggestedSellingPrice",
        alias = "suggestedsellingprice",
        alias = "suggested_selling_price",
        alias = "SuggestedPrice",
        alias = "suggestedPrice",
        default
    )]
    pub suggested_price: RawPrice,
}

impl ProductRow {
    /// Converts the row to a clean entity, or explains why it cannot be one.
    ///
    /// An `Err` here means "skip this row", not "abort the file".
    pub fn to_product(&self) -> ValidationResult<Product> {
        let name = self.name.trim();
        validate_product_name(name)?;

        let price = self.suggested_price.resolve();
        validate_price_cents(price.cents())?;

        Ok(Product {
            id: self.id,
            name: name.to_string(),
            weighted: parse_flag(&self.weighted),
            suggested_price_cents: price.cents(),
        })
    }

    /// Builds the canonical export row for an entity.
    pub fn from_entity(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            weighted: format_flag(product.weighted).to_string(),
            suggested_price: RawPrice::Text(product.suggested_price().to_wire()),
        }
    }
}

// =============================================================================
// BranchRow
// =============================================================================

/// A branch as carried by a transfer file.
///
/// ## Wire Shape
/// ```text
/// CSV:  ID,Name,TelephoneNumber,OpenDate
/// JSON: {"ID": 2, "Name": "Sandton", "TelephoneNumber": "0117845521", "OpenDate": "2019/03/18"}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchRow {
    #[serde(rename = "ID", alias = "Id", alias = "id", default)]
    pub id: i64,

    #[serde(rename = "Name", alias = "NAME", alias = "name", default)]
    pub name: String,

    /// Blank means "no telephone on file"; present values must be 10 digits.
    #[serde(
        rename = "TelephoneNumber",
        alias = "telephoneNumber",
        alias = "telephonenumber",
        alias = "telephone_number",
        alias = "Telephone",
        alias = "telephone",
        default
    )]
    pub telephone: String,

    /// Accepted in several formats on import; exported as `YYYY/MM/DD`.
    #[serde(
        rename = "OpenDate",
        alias = "openDate",
        alias = "opendate",
        alias = "open_date",
        default
    )]
    pub open_date: String,
}

impl BranchRow {
    /// Converts the row to a clean entity, or explains why it cannot be one.
    ///
    /// A blank telephone clears the stored value; an unparsable date clears
    /// the stored date. Only a present-but-malformed telephone skips the row.
    pub fn to_branch(&self) -> ValidationResult<Branch> {
        let name = self.name.trim();
        validate_branch_name(name)?;

        let telephone = normalize_optional(Some(self.telephone.as_str()));
        if let Some(digits) = &telephone {
            validate_telephone(digits)?;
        }

        Ok(Branch {
            id: self.id,
            name: name.to_string(),
            telephone,
            open_date: parse_date(&self.open_date),
        })
    }

    /// Builds the canonical export row for an entity.
    pub fn from_entity(branch: &Branch) -> Self {
        Self {
            id: branch.id,
            name: branch.name.clone(),
            telephone: branch.telephone.clone().unwrap_or_default(),
            open_date: format_date(branch.open_date),
        }
    }
}

// =============================================================================
// MappingRow
// =============================================================================

/// A branch-to-product assignment as carried by a transfer file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MappingRow {
    #[serde(
        rename = "BranchID",
        alias = "BranchId",
        alias = "branchId",
        alias = "branchid",
        alias = "branch_id",
        default
    )]
    pub branch_id: i64,

    #[serde(
        rename = "ProductID",
        alias = "ProductId",
        alias = "productId",
        alias = "productid",
        alias = "product_id",
        default
    )]
    pub product_id: i64,
}

impl MappingRow {
    pub fn to_assignment(&self) -> Assignment {
        Assignment {
            branch_id: self.branch_id,
            product_id: self.product_id,
        }
    }

    pub fn from_entity(assignment: &Assignment) -> Self {
        Self {
            branch_id: assignment.branch_id,
            product_id: assignment.product_id,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_raw_price_resolve() {
        assert_eq!(RawPrice::Absent.resolve(), Price::ZERO);
        assert_eq!(RawPrice::Text("15.50".into()).resolve(), Price::from_cents(1550));
        assert_eq!(RawPrice::Text("garbage".into()).resolve(), Price::ZERO);
        assert_eq!(RawPrice::Number(9.99).resolve(), Price::from_cents(999));
        assert_eq!(RawPrice::Number(15.0).resolve(), Price::from_cents(1500));
    }

    #[test]
    fn test_raw_price_from_json_string_and_number() {
        let from_text: RawPrice = serde_json::from_str("\"12.30\"").unwrap();
        assert_eq!(from_text, RawPrice::Text("12.30".into()));

        let from_number: RawPrice = serde_json::from_str("12.3").unwrap();
        assert_eq!(from_number, RawPrice::Number(12.3));

        let from_integer: RawPrice = serde_json::from_str("12").unwrap();
        assert_eq!(from_integer.resolve(), Price::from_cents(1200));

        let from_null: RawPrice = serde_json::from_str("null").unwrap();
        assert_eq!(from_null, RawPrice::Absent);
    }

    #[test]
    fn test_raw_price_from_text_content_map() {
        // XML leaf elements arrive as a map carrying the text under "$text"
        let from_map: RawPrice = serde_json::from_str(r#"{"$text": "15.50"}"#).unwrap();
        assert_eq!(from_map, RawPrice::Text("15.50".into()));

        let empty: RawPrice = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, RawPrice::Absent);
    }

    #[test]
    fn test_raw_price_serializes_as_wire_text() {
        let json = serde_json::to_string(&RawPrice::Text("15.50".into())).unwrap();
        assert_eq!(json, "\"15.5\"");

        let json = serde_json::to_string(&RawPrice::Number(15.0)).unwrap();
        assert_eq!(json, "\"15\"");
    }

    #[test]
    fn test_product_row_contract_keys() {
        let row: ProductRow = serde_json::from_str(
            r#"{"ID": 3, "Name": "Milk", "WeightedItem": "Y", "SuggestedSellingPrice": "15.50"}"#,
        )
        .unwrap();

        assert_eq!(row.id, 3);
        let product = row.to_product().unwrap();
        assert_eq!(product.name, "Milk");
        assert!(product.weighted);
        assert_eq!(product.suggested_price_cents, 1550);
    }

    #[test]
    fn test_branch_row_contract_keys() {
        let row: BranchRow = serde_json::from_str(
            r#"{"ID": 2, "Name": "Sandton", "TelephoneNumber": "0117845521", "OpenDate": "2019/03/18"}"#,
        )
        .unwrap();

        let branch = row.to_branch().unwrap();
        assert_eq!(branch.id, 2);
        assert_eq!(branch.telephone.as_deref(), Some("0117845521"));
        assert_eq!(branch.open_date, NaiveDate::from_ymd_opt(2019, 3, 18));
    }

    #[test]
    fn test_product_row_case_insensitive_keys() {
        let row: ProductRow = serde_json::from_str(
            r#"{"id": 7, "NAME": "Bread", "weighted": "y", "suggestedPrice": "18.99"}"#,
        )
        .unwrap();

        assert_eq!(row.id, 7);
        assert_eq!(row.name, "Bread");

        let product = row.to_product().unwrap();
        assert!(product.weighted);
        assert_eq!(product.suggested_price_cents, 1899);
    }

    #[test]
    fn test_product_row_missing_fields_default() {
        let row: ProductRow = serde_json::from_str(r#"{"Name": "Salt"}"#).unwrap();

        assert_eq!(row.id, 0);
        assert_eq!(row.suggested_price, RawPrice::Absent);

        let product = row.to_product().unwrap();
        assert!(!product.weighted);
        assert_eq!(product.suggested_price_cents, 0);
    }

    #[test]
    fn test_product_row_blank_name_is_invalid() {
        let row = ProductRow {
            name: "   ".into(),
            ..Default::default()
        };
        assert!(row.to_product().is_err());
    }

    #[test]
    fn test_product_row_round_trip() {
        let product = Product {
            id: 12,
            name: "Sugar 1kg".into(),
            weighted: true,
            suggested_price_cents: 2550,
        };

        let row = ProductRow::from_entity(&product);
        assert_eq!(row.weighted, "Y");
        assert_eq!(row.suggested_price.to_wire_text(), "25.5");
        assert_eq!(row.to_product().unwrap(), product);
    }

    #[test]
    fn test_branch_row_to_branch() {
        let row = BranchRow {
            id: 2,
            name: " Sandton ".into(),
            telephone: "0117845521".into(),
            open_date: "2019/03/18".into(),
        };

        let branch = row.to_branch().unwrap();
        assert_eq!(branch.name, "Sandton");
        assert_eq!(branch.telephone.as_deref(), Some("0117845521"));
        assert_eq!(branch.open_date, NaiveDate::from_ymd_opt(2019, 3, 18));
    }

    #[test]
    fn test_branch_row_blank_telephone_clears() {
        let row = BranchRow {
            id: 1,
            name: "CBD".into(),
            telephone: "  ".into(),
            open_date: String::new(),
        };

        let branch = row.to_branch().unwrap();
        assert_eq!(branch.telephone, None);
        assert_eq!(branch.open_date, None);
    }

    #[test]
    fn test_branch_row_bad_telephone_is_invalid() {
        let row = BranchRow {
            id: 1,
            name: "CBD".into(),
            telephone: "12345".into(),
            open_date: String::new(),
        };
        assert!(row.to_branch().is_err());
    }

    #[test]
    fn test_branch_row_unparsable_date_clears() {
        let row = BranchRow {
            id: 1,
            name: "CBD".into(),
            telephone: String::new(),
            open_date: "not a date".into(),
        };
        assert_eq!(row.to_branch().unwrap().open_date, None);
    }

    #[test]
    fn test_mapping_row_contract_keys() {
        let row: MappingRow =
            serde_json::from_str(r#"{"BranchID": 4, "ProductID": 11}"#).unwrap();
        assert_eq!(row.branch_id, 4);
        assert_eq!(row.product_id, 11);
    }

    #[test]
    fn test_mapping_row_aliases() {
        let row: MappingRow =
            serde_json::from_str(r#"{"branch_id": 3, "ProductId": 9}"#).unwrap();
        assert_eq!(row.branch_id, 3);
        assert_eq!(row.product_id, 9);
        assert_eq!(
            row.to_assignment(),
            Assignment {
                branch_id: 3,
                product_id: 9
            }
        );
    }
}
