//! taxcomp turns a tax-revenue-composition workbook into an animated stacked-bar chart.
//!
//! The pipeline is a one-shot batch:
//!
//! - Read the workbook into [`SourceRow`]s and extract a [`Dataset`] (with carry-forward of
//!   unpopulated years), or restore it from the [`DatasetCache`]
//! - For every year transition and sub-step, [`interpolate`] and [`compose_frame`] a chart
//! - Rasterize each [`ChartSpec`] and stream the frames, in order, into a [`FrameSink`]
//!
//! [`run_animation`] wires the whole thing together from a [`PipelineConfig`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod animate;
pub mod cache;
pub mod chart;
pub mod encode;
pub mod extract;
/// Configuration and error types.
pub mod foundation;
/// Year-to-year linear blending.
pub mod interpolate;
pub mod model;
pub mod pipeline;
pub mod source;
pub mod taxonomy;

pub use crate::animate::{AnimationStats, FramePlan, build_animation, plan_frames};
pub use crate::cache::DatasetCache;
pub use crate::chart::compose::{ChartSpec, compose_frame};
pub use crate::chart::raster::{ChartRasterizer, ChartRenderer, FrameRGBA};
pub use crate::encode::gif::GifSink;
pub use crate::encode::sink::{FrameIndex, FrameSink, InMemorySink, SinkConfig};
pub use crate::extract::carry_forward::{ExtractStats, extract_dataset};
pub use crate::foundation::config::{
    DEFAULT_BRAND_IMAGE, PathsConfig, PipelineConfig, RenderConfig,
};
pub use crate::foundation::error::{TaxcompError, TaxcompResult};
pub use crate::interpolate::interpolate;
pub use crate::model::{CountryRecord, Dataset, GroupFilter, Year, YearRecord};
pub use crate::pipeline::{DatasetOrigin, extract_to_cache, load_or_extract, run_animation};
pub use crate::source::cell::{Cell, SourceRow};
pub use crate::source::workbook::read_workbook;
pub use crate::taxonomy::{Category, CategorySpec, Taxonomy};
