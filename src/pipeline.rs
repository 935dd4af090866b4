//! Top-level entry points: load-or-extract and the full animation run.

use std::path::PathBuf;

use crate::animate::{AnimationStats, build_animation};
use crate::cache::DatasetCache;
use crate::chart::compose::brand_mark;
use crate::chart::raster::ChartRasterizer;
use crate::encode::gif::GifSink;
use crate::extract::carry_forward::{ExtractStats, extract_dataset};
use crate::foundation::config::PipelineConfig;
use crate::foundation::error::TaxcompResult;
use crate::model::Dataset;
use crate::source::workbook::read_workbook;

/// Where a dataset handed out by [`load_or_extract`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatasetOrigin {
    /// Restored from the cache artifact.
    Cache,
    /// Freshly extracted from the workbook (and written to the cache).
    Extracted,
}

/// Dataset from the cache when present, otherwise extracted and persisted.
///
/// `refresh` skips the cache read. A malformed cache is an error; delete the artifact (or pass
/// `refresh`) to rebuild it.
#[tracing::instrument(skip(cfg), fields(key = %cfg.paths.cache_key))]
pub fn load_or_extract(
    cfg: &PipelineConfig,
    refresh: bool,
) -> TaxcompResult<(Dataset, DatasetOrigin)> {
    cfg.validate()?;
    let cache = DatasetCache::new(&cfg.paths.cache_dir);

    if !refresh {
        match cache.load(&cfg.paths.cache_key) {
            Ok(dataset) => {
                tracing::info!(countries = dataset.len(), "loaded dataset from cache");
                return Ok((dataset, DatasetOrigin::Cache));
            }
            Err(e) if e.is_cache_not_found() => {
                tracing::info!("no cache yet; extracting from workbook");
            }
            Err(e) => return Err(e),
        }
    }

    let (dataset, _stats) = extract_to_cache(cfg)?;
    Ok((dataset, DatasetOrigin::Extracted))
}

/// Read the workbook, extract the dataset, and overwrite the cache artifact.
#[tracing::instrument(skip(cfg), fields(source = %cfg.paths.source.display()))]
pub fn extract_to_cache(cfg: &PipelineConfig) -> TaxcompResult<(Dataset, ExtractStats)> {
    cfg.validate()?;
    let rows = read_workbook(&cfg.paths.source, cfg.paths.sheet.as_deref())?;
    let (dataset, stats) = extract_dataset(&rows, cfg);
    let path = DatasetCache::new(&cfg.paths.cache_dir).save(&cfg.paths.cache_key, &dataset)?;
    tracing::info!(path = %path.display(), countries = dataset.len(), "cached dataset");
    Ok((dataset, stats))
}

/// Rasterizer for the configured frame size, with the brand image prepared when set.
pub fn rasterizer_for(cfg: &PipelineConfig) -> TaxcompResult<ChartRasterizer> {
    let rasterizer = ChartRasterizer::new(cfg.render.width, cfg.render.height)?;
    match brand_mark(cfg) {
        Some(mark) => rasterizer.with_brand(&mark),
        None => Ok(rasterizer),
    }
}

/// Load or extract the dataset, then write the animated GIF.
pub fn run_animation(
    cfg: &PipelineConfig,
    refresh: bool,
) -> TaxcompResult<(PathBuf, AnimationStats)> {
    let (dataset, origin) = load_or_extract(cfg, refresh)?;
    tracing::info!(?origin, countries = dataset.len(), mode = %cfg.mode_label(), "dataset ready");

    let rasterizer = rasterizer_for(cfg)?;
    let out = cfg.output_path();
    let mut sink = GifSink::new(&out);
    let stats = build_animation(&dataset, cfg, &rasterizer, &mut sink)?;
    Ok((out, stats))
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
