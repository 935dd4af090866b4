//! Pipeline configuration.
//!
//! Every component receives the parts of [`PipelineConfig`] it needs by reference; nothing reads
//! global state. A config file only has to name the fields it overrides.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{TaxcompError, TaxcompResult};
use crate::model::{GroupFilter, Year};
use crate::taxonomy::{self, Category, Taxonomy};

/// Logo picked up from the working directory when no brand image is configured.
pub const DEFAULT_BRAND_IMAGE: &str = "logo_full_white_on_blue.jpg";

/// Immutable configuration shared by every pipeline stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// First year extracted and animated.
    pub start_year: Year,
    /// Last year extracted; the animation ends on the transition into this year.
    pub end_year: Year,
    /// Source columns per year window.
    pub column_stride: usize,
    /// Source column where the first year's window begins.
    pub column_base: usize,
    /// Leading source rows that carry headers rather than countries.
    pub header_rows: usize,
    /// Column-offset table per category.
    pub taxonomy: Taxonomy,
    /// Bar stacking order, bottom first.
    pub stacking_order: Vec<Category>,
    /// Category → `#RRGGBB` fill.
    pub palette: BTreeMap<Category, String>,
    /// Category → legend text.
    pub labels: BTreeMap<Category, String>,
    /// Display name of the reference group.
    pub reference_group: String,
    /// Which countries the animation shows.
    pub group_filter: GroupFilter,
    /// Country whose axis label is emphasized.
    pub highlight_country: Option<String>,
    /// Interpolation steps per year transition (`K`); each transition yields `K + 1` frames.
    pub sub_steps: u32,
    /// Raster and encoder settings.
    pub render: RenderConfig,
    /// Input and output locations.
    pub paths: PathsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            start_year: 1990,
            end_year: 2021,
            column_stride: 65,
            column_base: 3,
            header_rows: 11,
            taxonomy: Taxonomy::default(),
            stacking_order: taxonomy::default_stacking_order(),
            palette: taxonomy::default_palette(),
            labels: taxonomy::default_labels(),
            reference_group: "OECD".to_string(),
            group_filter: GroupFilter::NonReference,
            highlight_country: Some("United Kingdom".to_string()),
            sub_steps: 5,
            render: RenderConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

/// Frame size and animation timing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Display duration of each frame.
    pub frame_delay_ms: u32,
    /// Whether the animation repeats forever.
    pub looping: bool,
    /// Optional brand image drawn in the top-right corner.
    pub brand_image: Option<PathBuf>,
    /// Render frames on a worker pool (output order is unchanged).
    pub parallel: bool,
    /// Frames per parallel chunk.
    pub chunk_size: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            frame_delay_ms: 100,
            looping: true,
            brand_image: None,
            parallel: false,
            chunk_size: 32,
        }
    }
}

/// Source, cache, and output locations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Workbook to extract from.
    pub source: PathBuf,
    /// Sheet name; the first sheet is used when unset.
    pub sheet: Option<String>,
    /// Directory holding cache artifacts.
    pub cache_dir: PathBuf,
    /// Logical cache name; the artifact is `<cache_dir>/<cache_key>.json`.
    pub cache_key: String,
    /// Animation output; derived from the group filter when unset.
    pub output: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("all_oecd_composition_data_1990_to_2021.xlsx"),
            sheet: Some("OECD.Stat export".to_string()),
            cache_dir: PathBuf::from("."),
            cache_key: "OECD_composition_totals".to_string(),
            output: None,
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> TaxcompResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> TaxcompResult<()> {
        if self.start_year > self.end_year {
            return Err(TaxcompError::validation(format!(
                "start_year {} is after end_year {}",
                self.start_year, self.end_year
            )));
        }
        if self.column_stride == 0 {
            return Err(TaxcompError::validation("column_stride must be non-zero"));
        }
        self.taxonomy.validate()?;

        let mut stacked = BTreeSet::new();
        for category in &self.stacking_order {
            if *category == Category::TotalRevenue {
                return Err(TaxcompError::validation(
                    "stacking_order must not include total_revenue",
                ));
            }
            if !stacked.insert(*category) {
                return Err(TaxcompError::validation(format!(
                    "stacking_order lists '{category}' more than once"
                )));
            }
            if !self.palette.contains_key(category) {
                return Err(TaxcompError::validation(format!(
                    "palette has no color for '{category}'"
                )));
            }
            if !self.labels.contains_key(category) {
                return Err(TaxcompError::validation(format!(
                    "labels has no legend text for '{category}'"
                )));
            }
        }

        if self.sub_steps == 0 {
            return Err(TaxcompError::validation("sub_steps must be at least 1"));
        }
        if self.render.width == 0 || self.render.height == 0 {
            return Err(TaxcompError::validation(
                "render width/height must be non-zero",
            ));
        }
        if self.render.chunk_size == 0 {
            return Err(TaxcompError::validation("render chunk_size must be non-zero"));
        }
        if self.highlight_country.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(TaxcompError::validation(
                "highlight_country must not be empty",
            ));
        }
        if self.paths.cache_key.trim().is_empty() {
            return Err(TaxcompError::validation("cache_key must not be empty"));
        }
        Ok(())
    }

    /// Source column where `year`'s window begins.
    pub fn window_start(&self, year: Year) -> usize {
        let offset = (year - self.start_year).max(0) as usize;
        offset * self.column_stride + self.column_base
    }

    /// Minimum usable row width for the configured year range.
    pub fn required_row_width(&self) -> usize {
        self.year_count() * self.column_stride + self.column_base
    }

    /// Years in `[start_year, end_year]`.
    pub fn years(&self) -> std::ops::RangeInclusive<Year> {
        self.start_year..=self.end_year
    }

    /// Number of years in the configured range.
    pub fn year_count(&self) -> usize {
        (self.end_year - self.start_year + 1).max(0) as usize
    }

    /// Display name of the configured group filter.
    pub fn mode_label(&self) -> String {
        self.group_filter.label(&self.reference_group)
    }

    /// Output path, defaulting to `tax_composition_<mode>.gif`.
    pub fn output_path(&self) -> PathBuf {
        self.paths.output.clone().unwrap_or_else(|| {
            PathBuf::from(format!(
                "tax_composition_{}.gif",
                self.mode_label().replace(' ', "_")
            ))
        })
    }

    /// Use [`DEFAULT_BRAND_IMAGE`] from `dir` as the brand when none is set and the file exists.
    pub fn with_default_brand_in(mut self, dir: &Path) -> Self {
        if self.render.brand_image.is_none() {
            let candidate = dir.join(DEFAULT_BRAND_IMAGE);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "using default brand image");
                self.render.brand_image = Some(candidate);
            }
        }
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
