use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::chart::compose::ChartSpec;
use crate::encode::sink::InMemorySink;
use crate::model::{CountryRecord, YearRecord};
use crate::taxonomy::Category;

/// Encodes the frame's year and first bar's income tax into the pixel bytes.
#[derive(Default)]
struct CountingRenderer {
    calls: AtomicUsize,
}

impl ChartRenderer for CountingRenderer {
    fn width(&self) -> u32 {
        1
    }

    fn height(&self) -> u32 {
        1
    }

    fn render(&self, spec: &ChartSpec) -> TaxcompResult<FrameRGBA> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let income = spec
            .series
            .iter()
            .find(|s| s.category == Category::IncomeTax)
            .and_then(|s| s.values.first().copied())
            .unwrap_or(0.0);
        Ok(FrameRGBA {
            width: 1,
            height: 1,
            data: vec![(spec.year - 2000) as u8, income.round() as u8, 0, 255],
            premultiplied: true,
        })
    }
}

fn cfg(start: Year, end: Year, k: u32) -> PipelineConfig {
    PipelineConfig {
        start_year: start,
        end_year: end,
        sub_steps: k,
        ..PipelineConfig::default()
    }
}

fn dataset() -> Dataset {
    let mut c = CountryRecord::new("A", false);
    for (year, income) in [(2000, 10.0), (2001, 20.0), (2002, 30.0)] {
        c.years.insert(
            year,
            YearRecord::from_pairs([(Category::TotalRevenue, 30.0), (Category::IncomeTax, income)]),
        );
    }
    [c].into_iter().collect()
}

fn pixels(sink: &InMemorySink) -> Vec<(u8, u8)> {
    sink.frames()
        .iter()
        .map(|(_, f)| (f.data[0], f.data[1]))
        .collect()
}

#[test]
fn plan_covers_every_transition_with_k_plus_one_frames() {
    let plan = plan_frames(&cfg(1990, 2021, 5));
    assert_eq!(plan.len(), 31 * 6);
    assert_eq!(plan[0].year, 1990);
    assert_eq!(plan[0].weight, 0.0);
    assert_eq!(plan[5].weight, 1.0);
    assert_eq!(plan[6].year, 1991);
    assert_eq!(plan.last().unwrap().year, 2020);
    assert!(plan.iter().enumerate().all(|(i, p)| p.index == i as u64));
}

#[test]
fn plan_weights_are_evenly_spaced() {
    let plan = plan_frames(&cfg(2000, 2001, 4));
    let weights: Vec<f64> = plan.iter().map(|p| p.weight).collect();
    assert_eq!(weights, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
}

#[test]
fn frames_arrive_in_year_then_weight_order() {
    let renderer = CountingRenderer::default();
    let mut sink = InMemorySink::new();
    let stats = build_animation(&dataset(), &cfg(2000, 2002, 5), &renderer, &mut sink).unwrap();

    assert_eq!(stats.frames, 12);
    assert_eq!(stats.transitions, 2);
    assert!(sink.is_finished());
    assert_eq!(
        pixels(&sink),
        vec![
            (0, 10),
            (0, 12),
            (0, 14),
            (0, 16),
            (0, 18),
            (0, 20),
            (1, 20),
            (1, 22),
            (1, 24),
            (1, 26),
            (1, 28),
            (1, 30),
        ]
    );
    let indices: Vec<u64> = sink.frames().iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, (0..12).collect::<Vec<_>>());
}

#[test]
fn parallel_build_matches_sequential_order() {
    let data = dataset();
    let seq_cfg = cfg(2000, 2002, 5);
    let mut par_cfg = seq_cfg.clone();
    par_cfg.render.parallel = true;
    par_cfg.render.chunk_size = 5;

    let mut seq = InMemorySink::new();
    build_animation(&data, &seq_cfg, &CountingRenderer::default(), &mut seq).unwrap();
    let renderer = CountingRenderer::default();
    let mut par = InMemorySink::new();
    build_animation(&data, &par_cfg, &renderer, &mut par).unwrap();

    assert_eq!(seq.frames(), par.frames());
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 12);
}

#[test]
fn sink_receives_render_settings() {
    let mut c = cfg(2000, 2001, 1);
    c.render.frame_delay_ms = 40;
    c.render.looping = false;
    let mut sink = InMemorySink::new();
    build_animation(&dataset(), &c, &CountingRenderer::default(), &mut sink).unwrap();
    let got = sink.config().unwrap();
    assert_eq!((got.width, got.height), (1, 1));
    assert_eq!(got.frame_delay_ms, 40);
    assert!(!got.looping);
}

#[test]
fn single_year_range_is_rejected() {
    let mut sink = InMemorySink::new();
    let err = build_animation(&dataset(), &cfg(2000, 2000, 5), &CountingRenderer::default(), &mut sink)
        .unwrap_err();
    assert!(matches!(err, TaxcompError::Validation(_)));
    assert!(sink.config().is_none());
}

#[test]
fn render_failures_propagate() {
    struct Failing;
    impl ChartRenderer for Failing {
        fn width(&self) -> u32 {
            1
        }
        fn height(&self) -> u32 {
            1
        }
        fn render(&self, _spec: &ChartSpec) -> TaxcompResult<FrameRGBA> {
            Err(TaxcompError::render("boom"))
        }
    }

    let mut sink = InMemorySink::new();
    let err = build_animation(&dataset(), &cfg(2000, 2001, 2), &Failing, &mut sink).unwrap_err();
    assert!(matches!(err, TaxcompError::Render(_)));
    assert!(sink.frames().is_empty());
}
