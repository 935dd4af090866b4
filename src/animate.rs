//! Animation sequencing: interpolate, compose, and rasterize every frame in order.

use rayon::prelude::*;
use serde::Serialize;

use crate::chart::compose::compose_frame;
use crate::chart::raster::{ChartRenderer, FrameRGBA};
use crate::encode::sink::{FrameIndex, FrameSink, SinkConfig};
use crate::foundation::config::PipelineConfig;
use crate::foundation::error::{TaxcompError, TaxcompResult};
use crate::interpolate::interpolate;
use crate::model::{Dataset, Year};

/// One planned frame: the year transition it belongs to and its interpolation weight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FramePlan {
    /// Position in the output sequence.
    pub index: FrameIndex,
    /// Transition start year; the frame sits between `year` and `year + 1`.
    pub year: Year,
    /// Weight toward `year + 1`, in `[0, 1]`.
    pub weight: f64,
}

/// Summary of a finished animation build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnimationStats {
    /// Frames pushed to the sink.
    pub frames: u64,
    /// Year transitions covered.
    pub transitions: u64,
}

/// Every frame of the animation in output order.
///
/// Years `start_year..end_year` each contribute `sub_steps + 1` frames with weights
/// `0, 1/K, ..., 1`, so a transition's last frame and the next transition's first frame show the
/// same year values.
pub fn plan_frames(cfg: &PipelineConfig) -> Vec<FramePlan> {
    let k = cfg.sub_steps.max(1);
    let mut out = Vec::new();
    let mut index: FrameIndex = 0;
    for year in cfg.start_year..cfg.end_year {
        for i in 0..=k {
            out.push(FramePlan {
                index,
                year,
                weight: f64::from(i) / f64::from(k),
            });
            index += 1;
        }
    }
    out
}

/// Interpolate, compose, and rasterize a single planned frame.
pub fn render_planned_frame(
    dataset: &Dataset,
    plan: &FramePlan,
    cfg: &PipelineConfig,
    renderer: &dyn ChartRenderer,
) -> TaxcompResult<FrameRGBA> {
    let blended = interpolate(dataset, plan.year, plan.weight)?;
    let spec = compose_frame(
        &blended,
        plan.year,
        cfg.group_filter,
        cfg.highlight_country.as_deref(),
        cfg,
    );
    renderer.render(&spec)
}

/// Render the whole animation into `sink`.
///
/// Frames reach the sink in plan order whether or not rendering runs in parallel.
#[tracing::instrument(skip_all, fields(start = cfg.start_year, end = cfg.end_year, k = cfg.sub_steps))]
pub fn build_animation(
    dataset: &Dataset,
    cfg: &PipelineConfig,
    renderer: &dyn ChartRenderer,
    sink: &mut dyn FrameSink,
) -> TaxcompResult<AnimationStats> {
    let plan = plan_frames(cfg);
    if plan.is_empty() {
        return Err(TaxcompError::validation(format!(
            "animation needs at least two years, got {}..={}",
            cfg.start_year, cfg.end_year
        )));
    }

    sink.begin(SinkConfig {
        width: renderer.width(),
        height: renderer.height(),
        frame_delay_ms: cfg.render.frame_delay_ms,
        looping: cfg.render.looping,
    })?;

    let mut stats = AnimationStats::default();
    if cfg.render.parallel {
        let chunk_size = cfg.render.chunk_size.max(1);
        for chunk in plan.chunks(chunk_size) {
            let frames = chunk
                .par_iter()
                .map(|p| render_planned_frame(dataset, p, cfg, renderer))
                .collect::<TaxcompResult<Vec<_>>>()?;
            for (p, frame) in chunk.iter().zip(&frames) {
                push(sink, p, frame, &mut stats)?;
            }
        }
    } else {
        for p in &plan {
            let frame = render_planned_frame(dataset, p, cfg, renderer)?;
            push(sink, p, &frame, &mut stats)?;
        }
    }

    sink.end()?;
    tracing::info!(
        frames = stats.frames,
        transitions = stats.transitions,
        "animation complete"
    );
    Ok(stats)
}

fn push(
    sink: &mut dyn FrameSink,
    plan: &FramePlan,
    frame: &FrameRGBA,
    stats: &mut AnimationStats,
) -> TaxcompResult<()> {
    if plan.weight == 0.0 {
        tracing::info!(year = plan.year, next = plan.year + 1, "rendering transition");
        stats.transitions += 1;
    }
    sink.push_frame(plan.index, frame)?;
    stats.frames += 1;
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/animate.rs"]
mod tests;
