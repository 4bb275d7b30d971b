//! Header schemas for the two known sales export layouts
//!
//! A sheet is accepted when its first row carries every required label of at
//! least one schema. Labels are compared after trimming and lower-casing, so
//! column order and extra columns do not matter.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::DigestError;

pub const SALES_GROUP: &str = "sales grp";
pub const CUSTOMER_CODE: &str = "customer code";
pub const CUSTOMER_NAME: &str = "customer name";
pub const MATERIAL_CODE: &str = "material code";
pub const MATERIAL_NAME: &str = "material name";
pub const SHIPPING_POINT_NAME: &str = "shipping point name";
pub const VEHICLE_TEXT: &str = "vehicle text";
pub const BILLING_DATE: &str = "billing date";
pub const QUANTITY_IN_SU: &str = "quantity in su";
pub const SKU_QTY: &str = "sku qty";

const DIMENSION_CHOICES: &str = "sales grp, customer code, material code";

const SCHEMA_A_LABELS: [&str; 8] = [
    SALES_GROUP,
    CUSTOMER_CODE,
    CUSTOMER_NAME,
    MATERIAL_CODE,
    SHIPPING_POINT_NAME,
    VEHICLE_TEXT,
    BILLING_DATE,
    QUANTITY_IN_SU,
];

const SCHEMA_B_LABELS: [&str; 8] = [
    SALES_GROUP,
    CUSTOMER_CODE,
    CUSTOMER_NAME,
    MATERIAL_NAME,
    MATERIAL_CODE,
    QUANTITY_IN_SU,
    BILLING_DATE,
    SKU_QTY,
];

/// Known spreadsheet header layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderSchema {
    /// Schema A: shipping-point export with vehicle text
    ShippingExport,
    /// Schema B: material export with SKU quantity
    MaterialExport,
}

impl HeaderSchema {
    pub const ALL: [HeaderSchema; 2] = [HeaderSchema::ShippingExport, HeaderSchema::MaterialExport];

    pub fn required_labels(&self) -> &'static [&'static str] {
        match self {
            HeaderSchema::ShippingExport => &SCHEMA_A_LABELS,
            HeaderSchema::MaterialExport => &SCHEMA_B_LABELS,
        }
    }

    /// Column label holding the values of a grouping dimension in this layout
    pub fn group_column(&self, dimension: GroupDimension) -> &'static str {
        match (self, dimension) {
            (_, GroupDimension::SalesGroup) => SALES_GROUP,
            (_, GroupDimension::CustomerCode) => CUSTOMER_CODE,
            (_, GroupDimension::MaterialCode) => MATERIAL_CODE,
        }
    }

    pub fn quantity_column(&self) -> &'static str {
        QUANTITY_IN_SU
    }

    pub fn customer_column(&self) -> &'static str {
        CUSTOMER_CODE
    }

    pub fn date_column(&self) -> &'static str {
        BILLING_DATE
    }

    pub fn name(&self) -> &'static str {
        match self {
            HeaderSchema::ShippingExport => "schema A (shipping export)",
            HeaderSchema::MaterialExport => "schema B (material export)",
        }
    }

    fn matches(&self, normalized: &[String]) -> bool {
        self.required_labels()
            .iter()
            .all(|label| normalized.iter().any(|h| h == label))
    }

    /// Detect which schema a header row satisfies, preferring schema A
    pub fn detect<S: AsRef<str>>(header: &[S]) -> Option<HeaderSchema> {
        let normalized = normalize_labels(header);
        if normalized.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|schema| schema.matches(&normalized))
    }
}

/// Column used as the key of a grouped aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupDimension {
    SalesGroup,
    CustomerCode,
    MaterialCode,
}

impl GroupDimension {
    pub const ALL: [GroupDimension; 3] = [
        GroupDimension::SalesGroup,
        GroupDimension::CustomerCode,
        GroupDimension::MaterialCode,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GroupDimension::SalesGroup => SALES_GROUP,
            GroupDimension::CustomerCode => CUSTOMER_CODE,
            GroupDimension::MaterialCode => MATERIAL_CODE,
        }
    }
}

impl fmt::Display for GroupDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GroupDimension {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_label(s).replace(['-', '_'], " ");
        match normalized.as_str() {
            "sales grp" | "sales group" => Ok(GroupDimension::SalesGroup),
            "customer code" => Ok(GroupDimension::CustomerCode),
            "material code" => Ok(GroupDimension::MaterialCode),
            _ => Err(DigestError::invalid(format!(
                "unknown grouping dimension '{}' (expected one of: {})",
                s, DIMENSION_CHOICES
            ))),
        }
    }
}

pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

fn normalize_labels<S: AsRef<str>>(header: &[S]) -> Vec<String> {
    header.iter().map(|h| normalize_label(h.as_ref())).collect()
}

/// True when the header row carries every label of schema A or schema B
pub fn is_valid_header<S: AsRef<str>>(header: &[S]) -> bool {
    HeaderSchema::detect(header).is_some()
}

/// Locate each required label in the header row.
///
/// Absent labels map to `None`; callers must not index a row with them.
pub fn column_indices<S: AsRef<str>>(
    header: &[S],
    required: &[&str],
) -> BTreeMap<String, Option<usize>> {
    let normalized = normalize_labels(header);
    required
        .iter()
        .map(|label| {
            let label = normalize_label(label);
            let idx = normalized.iter().position(|h| *h == label);
            (label, idx)
        })
        .collect()
}
