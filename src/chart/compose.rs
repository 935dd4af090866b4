use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::foundation::config::PipelineConfig;
use crate::model::{Dataset, GroupFilter, Year};
use crate::taxonomy::Category;

/// Backend-agnostic description of one stacked-bar chart frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Centered title text.
    pub title: String,
    /// Year the values belong to.
    pub year: Year,
    /// X-axis labels, one per bar, in display order.
    pub labels: Vec<AxisLabel>,
    /// Stacked series, bottom first; each `values` aligns with `labels`.
    pub series: Vec<Series>,
    /// Value axis.
    pub y_axis: YAxis,
    /// How series combine.
    pub bar_mode: BarMode,
    /// Optional corner logo.
    pub brand: Option<BrandMark>,
}

/// One bar label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisLabel {
    /// Country name.
    pub text: String,
    /// Drawn emphasized when set.
    pub highlighted: bool,
}

/// One category's values across the bars.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Category this series draws.
    pub category: Category,
    /// Legend text.
    pub legend: String,
    /// `#RRGGBB` fill.
    pub color: String,
    /// Value per bar, aligned with [`ChartSpec::labels`].
    pub values: Vec<f64>,
}

/// Linear value axis with evenly spaced gridlines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YAxis {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
    /// Gridline spacing.
    pub tick_step: f64,
    /// Axis title.
    pub title: String,
}

impl Default for YAxis {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 50.0,
            tick_step: 5.0,
            title: "% of GDP".to_string(),
        }
    }
}

impl YAxis {
    /// Tick values from `min` to `max` inclusive.
    pub fn ticks(&self) -> Vec<f64> {
        if self.tick_step.is_nan() || self.tick_step <= 0.0 || self.max < self.min {
            return vec![self.min];
        }
        let n = ((self.max - self.min) / self.tick_step + 1e-9).floor() as usize;
        (0..=n)
            .map(|i| self.min + i as f64 * self.tick_step)
            .collect()
    }
}

/// How multiple series share a bar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarMode {
    /// Series stack on top of each other.
    #[default]
    Stacked,
}

/// Frame corner a brand image is anchored to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    #[default]
    TopRight,
}

/// Logo placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrandMark {
    /// Image file.
    pub path: PathBuf,
    /// Anchor corner.
    pub corner: Corner,
    /// Logo width as a fraction of the frame width.
    pub size: f64,
}

/// Build the chart for `year` from a (possibly interpolated) dataset.
///
/// Countries passing `filter` are ranked by descending `total_revenue` for `year`; missing and
/// non-finite totals rank as 0. Ties keep the dataset's name order, not the sheet's row order, so
/// frames do not depend on where a country sat in the workbook. Every ranked country gets a bar;
/// categories or years absent from the data contribute 0.
pub fn compose_frame(
    dataset: &Dataset,
    year: Year,
    filter: GroupFilter,
    highlight: Option<&str>,
    cfg: &PipelineConfig,
) -> ChartSpec {
    let mut ranked: Vec<_> = dataset
        .countries()
        .filter(|c| filter.admits(c.reference_member))
        .map(|c| {
            let total = c
                .value(year, Category::TotalRevenue)
                .filter(|v| v.is_finite())
                .unwrap_or(0.0);
            (c, total)
        })
        .collect();
    // Stable sort: equal totals keep the dataset's name order.
    ranked.sort_by(|(_, a), (_, b)| b.total_cmp(a));

    let labels = ranked
        .iter()
        .map(|(c, _)| AxisLabel {
            text: c.name.clone(),
            highlighted: highlight.is_some_and(|h| h == c.name),
        })
        .collect();

    let series = cfg
        .stacking_order
        .iter()
        .map(|&category| Series {
            category,
            legend: cfg
                .labels
                .get(&category)
                .cloned()
                .unwrap_or_else(|| category.key().to_string()),
            color: cfg
                .palette
                .get(&category)
                .cloned()
                .unwrap_or_else(|| "#808080".to_string()),
            values: ranked
                .iter()
                .map(|(c, _)| {
                    c.value(year, category)
                        .filter(|v| v.is_finite())
                        .unwrap_or(0.0)
                })
                .collect(),
        })
        .collect();

    ChartSpec {
        title: format!(
            "{} tax system composition (% of GDP, {year})",
            filter.label(&cfg.reference_group)
        ),
        year,
        labels,
        series,
        y_axis: YAxis::default(),
        bar_mode: BarMode::Stacked,
        brand: brand_mark(cfg),
    }
}

/// Logo placement for the configured brand image: top-right, 8% of the frame width.
pub fn brand_mark(cfg: &PipelineConfig) -> Option<BrandMark> {
    cfg.render.brand_image.as_ref().map(|path| BrandMark {
        path: path.clone(),
        corner: Corner::TopRight,
        size: 0.08,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/chart/compose.rs"]
mod tests;
