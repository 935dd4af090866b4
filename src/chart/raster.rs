use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::chart::compose::{BrandMark, ChartSpec, Corner};
use crate::chart::svg::chart_to_svg;
use crate::foundation::error::{TaxcompError, TaxcompResult};

const BRAND_MARGIN: u32 = 8;

/// A rendered frame as RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)` as `[r, g, b, a]`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// Turns a chart description into pixels.
///
/// Implementations must be shareable across worker threads; parallel animation builds call
/// [`ChartRenderer::render`] concurrently.
pub trait ChartRenderer: Sync {
    /// Output frame width.
    fn width(&self) -> u32;
    /// Output frame height.
    fn height(&self) -> u32;
    /// Rasterize one chart.
    fn render(&self, spec: &ChartSpec) -> TaxcompResult<FrameRGBA>;
}

/// Default renderer: SVG via `usvg`, rasterized by `resvg`, logo composited with `image`.
pub struct ChartRasterizer {
    width: u32,
    height: u32,
    fontdb: Arc<usvg::fontdb::Database>,
    brand: Option<PreparedBrand>,
}

struct PreparedBrand {
    source: PathBuf,
    image: image::RgbaImage,
}

impl ChartRasterizer {
    /// Rasterizer with system fonts loaded.
    pub fn new(width: u32, height: u32) -> TaxcompResult<Self> {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "loaded system fonts");
        Self::with_fontdb(width, height, Arc::new(db))
    }

    /// Rasterizer using a caller-provided font database.
    pub fn with_fontdb(
        width: u32,
        height: u32,
        fontdb: Arc<usvg::fontdb::Database>,
    ) -> TaxcompResult<Self> {
        if width == 0 || height == 0 {
            return Err(TaxcompError::validation(
                "raster width/height must be non-zero",
            ));
        }
        Ok(Self {
            width,
            height,
            fontdb,
            brand: None,
        })
    }

    /// Decode and scale the brand image up front so frames never touch the filesystem.
    pub fn with_brand(mut self, mark: &BrandMark) -> TaxcompResult<Self> {
        self.brand = Some(prepare_brand(&mark.path, mark.size, self.width)?);
        Ok(self)
    }

    fn overlay_brand(&self, canvas: &mut image::RgbaImage, mark: &BrandMark) -> TaxcompResult<()> {
        let brand = self
            .brand
            .as_ref()
            .filter(|b| b.source == mark.path)
            .ok_or_else(|| {
                TaxcompError::render(format!(
                    "brand image '{}' was not prepared for this rasterizer",
                    mark.path.display()
                ))
            })?;

        let bw = brand.image.width();
        let x = match mark.corner {
            Corner::TopLeft => BRAND_MARGIN,
            Corner::TopRight => self.width.saturating_sub(bw + BRAND_MARGIN),
        };
        image::imageops::overlay(canvas, &brand.image, x as i64, BRAND_MARGIN as i64);
        Ok(())
    }
}

impl ChartRenderer for ChartRasterizer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn render(&self, spec: &ChartSpec) -> TaxcompResult<FrameRGBA> {
        let svg = chart_to_svg(spec, self.width, self.height);
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            font_resolver: make_font_resolver(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &opts)
            .map_err(|e| TaxcompError::render(format!("chart svg rejected: {e}")))?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(self.width, self.height)
            .ok_or_else(|| TaxcompError::render("failed to allocate chart pixmap"))?;
        pixmap.fill(resvg::tiny_skia::Color::WHITE);
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );

        // The white fill makes every pixel opaque, so premultiplied and straight alpha coincide
        // and the logo can be blended directly.
        let mut data = pixmap.take();
        if let Some(mark) = &spec.brand {
            let mut canvas = image::RgbaImage::from_raw(self.width, self.height, data)
                .ok_or_else(|| TaxcompError::render("chart pixmap size mismatch"))?;
            self.overlay_brand(&mut canvas, mark)?;
            data = canvas.into_raw();
        }

        Ok(FrameRGBA {
            width: self.width,
            height: self.height,
            data,
            premultiplied: true,
        })
    }
}

fn prepare_brand(path: &Path, size: f64, frame_width: u32) -> TaxcompResult<PreparedBrand> {
    if !size.is_finite() || size <= 0.0 || size > 1.0 {
        return Err(TaxcompError::validation(format!(
            "brand size must be within (0, 1], got {size}"
        )));
    }
    let decoded = image::open(path)
        .with_context(|| format!("decode brand image '{}'", path.display()))?
        .to_rgba8();
    let (iw, ih) = decoded.dimensions();
    if iw == 0 || ih == 0 {
        return Err(TaxcompError::render(format!(
            "brand image '{}' is empty",
            path.display()
        )));
    }

    let bw = ((frame_width as f64 * size).round() as u32).max(1);
    let bh = ((bw as f64 * ih as f64 / iw as f64).round() as u32).max(1);
    let image = image::imageops::resize(&decoded, bw, bh, image::imageops::FilterType::Triangle);
    tracing::debug!(path = %path.display(), bw, bh, "prepared brand image");

    Ok(PreparedBrand {
        source: path.to_path_buf(),
        image,
    })
}

fn make_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<usvg::fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                });
            }
            families.push(usvg::fontdb::Family::SansSerif);

            let weight = usvg::fontdb::Weight(font.weight());
            let style = match font.style() {
                usvg::FontStyle::Normal => usvg::fontdb::Style::Normal,
                usvg::FontStyle::Italic => usvg::fontdb::Style::Italic,
                usvg::FontStyle::Oblique => usvg::fontdb::Style::Oblique,
            };

            let query = usvg::fontdb::Query {
                families: &families,
                weight,
                stretch: usvg::fontdb::Stretch::Normal,
                style,
            };

            // Any installed face beats dropping the label.
            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/chart/raster.rs"]
mod tests;
