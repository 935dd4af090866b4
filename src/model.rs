//! Normalized per-country, per-year tax composition data.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

use crate::taxonomy::Category;

/// Calendar year key.
pub type Year = i32;

/// Which population a chart shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupFilter {
    /// Reference-group members only.
    Reference,
    /// Countries outside the reference group only.
    #[default]
    NonReference,
    /// Every country.
    All,
}

impl GroupFilter {
    /// Whether a country with the given membership flag passes this filter.
    pub fn admits(self, reference_member: bool) -> bool {
        match self {
            Self::Reference => reference_member,
            Self::NonReference => !reference_member,
            Self::All => true,
        }
    }

    /// Human-readable mode name, e.g. `"OECD"` / `"Non-OECD"`.
    pub fn label(self, reference_group: &str) -> String {
        match self {
            Self::Reference => reference_group.to_string(),
            Self::NonReference => format!("Non-{reference_group}"),
            Self::All => format!("{reference_group} and non-{reference_group}"),
        }
    }
}

/// One year's value (percent of GDP) for every category in the closed set.
///
/// Every category always has an entry; unset categories read as `0.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct YearRecord {
    values: [f64; Category::COUNT],
}

impl YearRecord {
    /// A record with every category at zero.
    pub fn zeroed() -> Self {
        Self::default()
    }

    /// Build a record from `(category, value)` pairs; unspecified categories are zero.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Category, f64)>) -> Self {
        let mut rec = Self::zeroed();
        for (category, value) in pairs {
            rec.set(category, value);
        }
        rec
    }

    /// Value for one category.
    pub fn get(&self, category: Category) -> f64 {
        self.values[category.index()]
    }

    /// Overwrite one category.
    pub fn set(&mut self, category: Category, value: f64) {
        self.values[category.index()] = value;
    }

    /// `(category, value)` pairs in canonical category order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        Category::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    /// Per-category linear blend: `self * (1 - w) + next * w`.
    pub fn lerp(&self, next: &YearRecord, w: f64) -> YearRecord {
        let mut out = Self::zeroed();
        for category in Category::ALL {
            let v = self.get(category) * (1.0 - w) + next.get(category) * w;
            out.set(category, v);
        }
        out
    }
}

/// One country's membership flag and year series.
#[derive(Clone, Debug, PartialEq)]
pub struct CountryRecord {
    /// Trimmed, non-empty display name; unique within a [`Dataset`].
    pub name: String,
    /// Whether the country belongs to the reference group.
    pub reference_member: bool,
    /// Sparse year series; contiguous from the first observed year onward.
    pub years: BTreeMap<Year, YearRecord>,
}

impl CountryRecord {
    /// A country with no year data yet.
    pub fn new(name: impl Into<String>, reference_member: bool) -> Self {
        Self {
            name: name.into(),
            reference_member,
            years: BTreeMap::new(),
        }
    }

    /// Record for `year`, if any.
    pub fn year(&self, year: Year) -> Option<&YearRecord> {
        self.years.get(&year)
    }

    /// Value of one category for `year`, if the year is present.
    pub fn value(&self, year: Year, category: Category) -> Option<f64> {
        self.year(year).map(|rec| rec.get(category))
    }
}

/// Country name → record. Read-only once built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    countries: BTreeMap<String, CountryRecord>,
}

impl Dataset {
    /// An empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a country keyed by its name, returning any record it replaced.
    pub fn insert(&mut self, country: CountryRecord) -> Option<CountryRecord> {
        self.countries.insert(country.name.clone(), country)
    }

    /// Look up a country by name.
    pub fn get(&self, name: &str) -> Option<&CountryRecord> {
        self.countries.get(name)
    }

    /// Countries in name order.
    pub fn countries(&self) -> btree_map::Values<'_, String, CountryRecord> {
        self.countries.values()
    }

    /// Number of countries.
    pub fn len(&self) -> usize {
        self.countries.len()
    }

    /// Whether the dataset holds no countries.
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Smallest and largest year present across all countries.
    pub fn year_span(&self) -> Option<(Year, Year)> {
        let mut span: Option<(Year, Year)> = None;
        for country in self.countries.values() {
            let (Some(first), Some(last)) = (country.years.keys().next(), country.years.keys().last())
            else {
                continue;
            };
            span = Some(match span {
                None => (*first, *last),
                Some((lo, hi)) => (lo.min(*first), hi.max(*last)),
            });
        }
        span
    }
}

impl FromIterator<CountryRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = CountryRecord>>(iter: I) -> Self {
        let mut ds = Dataset::new();
        for country in iter {
            ds.insert(country);
        }
        ds
    }
}

#[cfg(test)]
#[path = "../tests/unit/model.rs"]
mod tests;
