//! Chart frames: ranking and series layout, SVG drawing, rasterization.

/// Dataset → [`ChartSpec`](compose::ChartSpec).
pub mod compose;
/// `usvg`/`resvg` rasterization and the renderer trait.
pub mod raster;
/// SVG document generation.
pub mod svg;
