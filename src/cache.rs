//! JSON persistence for extracted datasets.
//!
//! File layout (`<dir>/<key>.json`):
//!
//! ```json
//! {
//!   "Austria": {
//!     "OECD": true,
//!     "1990": { "total_revenue": 39.7, "income_tax": 9.1, "NI": 13.2, ... },
//!     "1991": { ... }
//!   }
//! }
//! ```
//!
//! Year keys are stringified integers and every numeric leaf is written as a JSON number, so
//! integral source values come back as `f64`. Non-finite values serialize as `null` and make the
//! artifact unloadable. Entries are never invalidated here; callers decide when to re-extract.

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde_json::{Map, Value};

use crate::foundation::error::{TaxcompError, TaxcompResult};
use crate::model::{CountryRecord, Dataset, Year, YearRecord};
use crate::taxonomy::Category;

/// Key holding the reference-group membership flag inside each country object.
pub const MEMBER_KEY: &str = "OECD";

/// Directory-backed dataset cache.
#[derive(Clone, Debug)]
pub struct DatasetCache {
    dir: PathBuf,
}

impl DatasetCache {
    /// Cache rooted at `dir` (created on first save).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Artifact path for a logical key.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Whether an artifact exists for `key`.
    pub fn exists(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }

    /// Persist `dataset` under `key`, replacing any previous artifact.
    ///
    /// The document is written to a temporary sibling and renamed into place, so an interrupted
    /// save leaves the previous artifact (or none) rather than a truncated one.
    #[tracing::instrument(skip(self, dataset), fields(countries = dataset.len()))]
    pub fn save(&self, key: &str, dataset: &Dataset) -> TaxcompResult<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create cache dir '{}'", self.dir.display()))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let doc = dataset_to_value(dataset);

        if let Err(err) = write_json(&tmp, &doc) {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        fs::rename(&tmp, &path).with_context(|| {
            format!("move '{}' into place at '{}'", tmp.display(), path.display())
        })?;

        tracing::info!(path = %path.display(), "saved dataset cache");
        Ok(path)
    }

    /// Load the dataset stored under `key`.
    ///
    /// Returns [`TaxcompError::CacheNotFound`] when nothing was saved under `key`, and
    /// [`TaxcompError::CacheMalformed`] when the artifact is not a dataset document.
    #[tracing::instrument(skip(self))]
    pub fn load(&self, key: &str) -> TaxcompResult<Dataset> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TaxcompError::cache_not_found(path));
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read cache '{}'", path.display()))
                    .into());
            }
        };

        let doc: Value = serde_json::from_str(&raw).map_err(|e| {
            TaxcompError::cache_malformed(format!("'{}' is not valid JSON: {e}", path.display()))
        })?;
        let dataset = dataset_from_value(&doc)?;
        tracing::info!(path = %path.display(), countries = dataset.len(), "loaded dataset cache");
        Ok(dataset)
    }
}

fn write_json(path: &Path, doc: &Value) -> TaxcompResult<()> {
    let f = File::create(path).with_context(|| format!("create '{}'", path.display()))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer(&mut w, doc).with_context(|| format!("write '{}'", path.display()))?;
    w.flush()
        .with_context(|| format!("flush '{}'", path.display()))?;
    Ok(())
}

/// Convert a dataset into its string-keyed cache document.
pub fn dataset_to_value(dataset: &Dataset) -> Value {
    let mut root = Map::new();
    for country in dataset.countries() {
        let mut obj = Map::new();
        obj.insert(MEMBER_KEY.to_string(), Value::Bool(country.reference_member));
        for (year, rec) in &country.years {
            let mut cats = Map::new();
            for (category, value) in rec.iter() {
                cats.insert(category.key().to_string(), Value::from(value));
            }
            obj.insert(year.to_string(), Value::Object(cats));
        }
        root.insert(country.name.clone(), Value::Object(obj));
    }
    Value::Object(root)
}

/// Rebuild a dataset from a cache document, checking its shape.
pub fn dataset_from_value(doc: &Value) -> TaxcompResult<Dataset> {
    let root = doc
        .as_object()
        .ok_or_else(|| TaxcompError::cache_malformed("top level is not an object"))?;

    let mut dataset = Dataset::new();
    for (name, body) in root {
        if name.trim().is_empty() {
            return Err(TaxcompError::cache_malformed("empty country name"));
        }
        let obj = body.as_object().ok_or_else(|| {
            TaxcompError::cache_malformed(format!("country '{name}' is not an object"))
        })?;
        let member = obj
            .get(MEMBER_KEY)
            .and_then(Value::as_bool)
            .ok_or_else(|| {
                TaxcompError::cache_malformed(format!(
                    "country '{name}' has no boolean '{MEMBER_KEY}' flag"
                ))
            })?;

        let mut country = CountryRecord::new(name.clone(), member);
        for (key, value) in obj {
            if key == MEMBER_KEY {
                continue;
            }
            let year: Year = key.parse().map_err(|_| {
                TaxcompError::cache_malformed(format!("country '{name}' has non-year key '{key}'"))
            })?;
            country
                .years
                .insert(year, year_record_from_value(name, year, value)?);
        }
        dataset.insert(country);
    }
    Ok(dataset)
}

fn year_record_from_value(name: &str, year: Year, value: &Value) -> TaxcompResult<YearRecord> {
    let cats = value.as_object().ok_or_else(|| {
        TaxcompError::cache_malformed(format!("'{name}'/{year} is not an object"))
    })?;

    if let Some(unknown) = cats.keys().find(|k| Category::from_key(k).is_none()) {
        return Err(TaxcompError::cache_malformed(format!(
            "'{name}'/{year} has unknown category '{unknown}'"
        )));
    }

    let mut rec = YearRecord::zeroed();
    for category in Category::ALL {
        let v = cats
            .get(category.key())
            .ok_or_else(|| {
                TaxcompError::cache_malformed(format!("'{name}'/{year} is missing '{category}'"))
            })?
            .as_f64()
            .ok_or_else(|| {
                TaxcompError::cache_malformed(format!(
                    "'{name}'/{year}/{category} is not a number"
                ))
            })?;
        rec.set(category, v);
    }
    Ok(rec)
}

#[cfg(test)]
#[path = "../tests/unit/cache.rs"]
mod tests;
