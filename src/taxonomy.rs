//! The fixed tax category set and the declarative column-offset table that derives each category
//! from a source row.
//!
//! Offsets are relative to the start of one year's column window. A non-negative offset adds the
//! cell at that position; a negative offset subtracts the cell at its absolute position. The same
//! source column may feed several categories: categories are independent views, not a partition.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{TaxcompError, TaxcompResult};

/// One named tax revenue measure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Total tax revenue; also the primary indicator driving carry-forward.
    #[serde(rename = "total_revenue")]
    TotalRevenue,
    /// Personal income tax.
    #[serde(rename = "income_tax")]
    IncomeTax,
    /// National insurance / social security contributions.
    #[serde(rename = "NI")]
    NationalInsurance,
    /// Value added tax.
    #[serde(rename = "VAT")]
    Vat,
    /// Taxes on goods and services other than VAT.
    #[serde(rename = "non_VAT_sales")]
    NonVatSales,
    /// Corporate income tax.
    #[serde(rename = "corporate")]
    Corporate,
    /// Property and wealth taxes.
    #[serde(rename = "property")]
    Property,
}

impl Category {
    /// Number of categories in the closed set.
    pub const COUNT: usize = 7;

    /// Every category, in canonical order.
    pub const ALL: [Category; Category::COUNT] = [
        Category::TotalRevenue,
        Category::IncomeTax,
        Category::NationalInsurance,
        Category::Vat,
        Category::NonVatSales,
        Category::Corporate,
        Category::Property,
    ];

    /// Stable key used in cache files and configuration.
    pub fn key(self) -> &'static str {
        match self {
            Self::TotalRevenue => "total_revenue",
            Self::IncomeTax => "income_tax",
            Self::NationalInsurance => "NI",
            Self::Vat => "VAT",
            Self::NonVatSales => "non_VAT_sales",
            Self::Corporate => "corporate",
            Self::Property => "property",
        }
    }

    /// Inverse of [`Category::key`].
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// How one category is derived from a year's column window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySpec {
    /// The category this entry computes.
    pub category: Category,
    /// Signed column offsets, applied in order.
    pub offsets: Vec<i32>,
}

impl CategorySpec {
    /// Build a spec entry.
    pub fn new(category: Category, offsets: impl Into<Vec<i32>>) -> Self {
        Self {
            category,
            offsets: offsets.into(),
        }
    }

    /// Largest relative column this spec reads.
    pub fn max_reach(&self) -> usize {
        self.offsets
            .iter()
            .map(|o| o.unsigned_abs() as usize)
            .max()
            .unwrap_or(0)
    }
}

/// The full category table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Taxonomy {
    specs: Vec<CategorySpec>,
}

impl Taxonomy {
    /// Build a taxonomy and check that it covers every category exactly once.
    pub fn new(specs: Vec<CategorySpec>) -> TaxcompResult<Self> {
        let taxonomy = Self { specs };
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// Entries in declaration order.
    pub fn specs(&self) -> &[CategorySpec] {
        &self.specs
    }

    /// Look up the entry for one category.
    pub fn spec(&self, category: Category) -> Option<&CategorySpec> {
        self.specs.iter().find(|s| s.category == category)
    }

    /// Widest relative column read by any entry.
    pub fn max_reach(&self) -> usize {
        self.specs
            .iter()
            .map(CategorySpec::max_reach)
            .max()
            .unwrap_or(0)
    }

    /// Check coverage, uniqueness, and non-empty offsets.
    pub fn validate(&self) -> TaxcompResult<()> {
        let mut seen = [false; Category::COUNT];
        for spec in &self.specs {
            if spec.offsets.is_empty() {
                return Err(TaxcompError::validation(format!(
                    "taxonomy entry '{}' has no column offsets",
                    spec.category
                )));
            }
            if std::mem::replace(&mut seen[spec.category.index()], true) {
                return Err(TaxcompError::validation(format!(
                    "taxonomy lists '{}' more than once",
                    spec.category
                )));
            }
        }
        if let Some(missing) = Category::ALL.into_iter().find(|c| !seen[c.index()]) {
            return Err(TaxcompError::validation(format!(
                "taxonomy has no entry for '{missing}'"
            )));
        }
        Ok(())
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        // Income tax falls back to total personal tax less capital gains for countries that do
        // not report the income component separately.
        Self {
            specs: vec![
                CategorySpec::new(Category::TotalRevenue, [0]),
                CategorySpec::new(Category::IncomeTax, [2, -4, 8]),
                CategorySpec::new(Category::NationalInsurance, [9, 22]),
                CategorySpec::new(Category::Vat, [41]),
                CategorySpec::new(Category::NonVatSales, [38, -41]),
                CategorySpec::new(Category::Corporate, [5]),
                CategorySpec::new(Category::Property, [4, 23]),
            ],
        }
    }
}

/// Bar stacking order, bottom first.
pub fn default_stacking_order() -> Vec<Category> {
    vec![
        Category::IncomeTax,
        Category::NationalInsurance,
        Category::Vat,
        Category::NonVatSales,
        Category::Corporate,
        Category::Property,
    ]
}

/// Category → `#RRGGBB` fill color.
pub fn default_palette() -> BTreeMap<Category, String> {
    [
        (Category::IncomeTax, "#002060"),
        (Category::NationalInsurance, "#0070C0"),
        (Category::Corporate, "#00B050"),
        (Category::Property, "#FFC000"),
        (Category::Vat, "#E62F33"),
        (Category::NonVatSales, "#C00000"),
    ]
    .into_iter()
    .map(|(c, hex)| (c, hex.to_string()))
    .collect()
}

/// Category → legend text.
pub fn default_labels() -> BTreeMap<Category, String> {
    [
        (Category::IncomeTax, "Personal income tax"),
        (Category::NationalInsurance, "National insurance/social security"),
        (Category::Corporate, "Corporate tax"),
        (Category::Property, "Property and wealth taxes"),
        (Category::Vat, "Value Added Tax"),
        (Category::NonVatSales, "Other taxes on goods/services"),
    ]
    .into_iter()
    .map(|(c, label)| (c, label.to_string()))
    .collect()
}

#[cfg(test)]
#[path = "../tests/unit/taxonomy.rs"]
mod tests;
