use std::fmt::Write as _;

use crate::chart::compose::ChartSpec;

const FONT: &str = "sans-serif";
const MARGIN_TOP: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 120.0;
const MARGIN_LEFT: f64 = 60.0;
const BAR_FILL_RATIO: f64 = 0.8;
const HIGHLIGHT_COLOR: &str = "#FF0000";

/// Plot-area geometry in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotArea {
    /// Left edge.
    pub x0: f64,
    /// Top edge.
    pub y0: f64,
    /// Right edge.
    pub x1: f64,
    /// Bottom edge (value-axis minimum).
    pub y1: f64,
}

impl PlotArea {
    /// Plot area for a `width` x `height` frame; never narrower or shorter than one pixel.
    pub fn for_frame(width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        let x0 = MARGIN_LEFT.min(w / 4.0);
        let y0 = MARGIN_TOP.min(h / 4.0);
        let x1 = (w - MARGIN_RIGHT.min(w / 8.0)).max(x0 + 1.0);
        let y1 = (h - MARGIN_BOTTOM.min(h / 3.0)).max(y0 + 1.0);
        Self { x0, y0, x1, y1 }
    }

    /// Plot width.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Plot height.
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

/// Render `spec` as a standalone SVG document of `width` x `height` pixels.
///
/// Positive values stack upward from zero and negative values stack downward; bars are clipped to
/// the plot area so values beyond the axis range are cut rather than overdrawn.
pub fn chart_to_svg(spec: &ChartSpec, width: u32, height: u32) -> String {
    let area = PlotArea::for_frame(width, height);
    let axis = &spec.y_axis;
    let span = (axis.max - axis.min).max(f64::EPSILON);
    let y_of = |v: f64| area.y1 - (v - axis.min) / span * area.height();

    let mut s = String::with_capacity(16 * 1024);
    let _ = write!(
        s,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="{FONT}">"#
    );
    let _ = write!(
        s,
        r#"<defs><clipPath id="plot"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath></defs>"#,
        n(area.x0),
        n(area.y0),
        n(area.width()),
        n(area.height())
    );
    let _ = write!(
        s,
        r##"<rect x="0" y="0" width="{width}" height="{height}" fill="#FFFFFF"/>"##
    );

    // Title.
    let _ = write!(
        s,
        r##"<text x="{}" y="{}" font-size="24" text-anchor="middle" fill="#2A3F5F">{}</text>"##,
        n(width as f64 / 2.0),
        n((area.y0 * 0.6).max(12.0)),
        escape_xml(&spec.title)
    );

    // Gridlines and tick labels.
    for tick in axis.ticks() {
        let y = y_of(tick);
        let _ = write!(
            s,
            r##"<line x1="{}" y1="{y}" x2="{}" y2="{y}" stroke="#E5ECF6" stroke-width="1"/>"##,
            n(area.x0),
            n(area.x1),
            y = n(y)
        );
        let _ = write!(
            s,
            r##"<text x="{}" y="{}" font-size="12" text-anchor="end" fill="#2A3F5F">{}</text>"##,
            n(area.x0 - 6.0),
            n(y + 4.0),
            fmt_tick(tick)
        );
    }
    let _ = write!(
        s,
        r##"<text transform="translate({},{}) rotate(-90)" font-size="20" text-anchor="middle" fill="#2A3F5F">{}</text>"##,
        n((area.x0 / 3.0).max(10.0)),
        n(area.y0 + area.height() / 2.0),
        escape_xml(&axis.title)
    );

    // Bars.
    let count = spec.labels.len();
    if count > 0 {
        let band = area.width() / count as f64;
        let bar_w = band * BAR_FILL_RATIO;
        s.push_str(r#"<g clip-path="url(#plot)">"#);
        for i in 0..count {
            let x = area.x0 + band * i as f64 + (band - bar_w) / 2.0;
            let mut up = 0.0;
            let mut down = 0.0;
            for series in &spec.series {
                let v = series.values.get(i).copied().unwrap_or(0.0);
                if !v.is_finite() || v == 0.0 {
                    continue;
                }
                let (lo, hi) = if v > 0.0 {
                    let seg = (up, up + v);
                    up += v;
                    seg
                } else {
                    let seg = (down + v, down);
                    down += v;
                    seg
                };
                let top = y_of(hi);
                let h = y_of(lo) - top;
                let _ = write!(
                    s,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
                    n(x),
                    n(top),
                    n(bar_w),
                    n(h),
                    escape_xml(&series.color)
                );
            }
        }
        s.push_str("</g>");

        for (i, label) in spec.labels.iter().enumerate() {
            let cx = area.x0 + band * (i as f64 + 0.5);
            let style = if label.highlighted {
                format!(r#" fill="{HIGHLIGHT_COLOR}" font-weight="bold""#)
            } else {
                r##" fill="#2A3F5F""##.to_string()
            };
            let _ = write!(
                s,
                r#"<text transform="translate({},{}) rotate(-45)" font-size="11" text-anchor="end"{style}>{}</text>"#,
                n(cx),
                n(area.y1 + 10.0),
                escape_xml(&label.text)
            );
        }
    }

    // Legend, top of the stack first.
    if !spec.series.is_empty() {
        let longest = spec
            .series
            .iter()
            .map(|s| s.legend.chars().count())
            .max()
            .unwrap_or(0);
        let box_w = longest as f64 * 6.5 + 34.0;
        let box_h = spec.series.len() as f64 * 18.0 + 10.0;
        let bx = area.x1 - box_w - 10.0;
        let by = area.y0 + 10.0;
        let _ = write!(
            s,
            r##"<rect x="{}" y="{}" width="{}" height="{}" fill="#FFFFFF" fill-opacity="0.85" stroke="#D0D0D0"/>"##,
            n(bx),
            n(by),
            n(box_w),
            n(box_h)
        );
        for (row, series) in spec.series.iter().rev().enumerate() {
            let ry = by + 8.0 + row as f64 * 18.0;
            let _ = write!(
                s,
                r#"<rect x="{}" y="{}" width="12" height="12" fill="{}"/>"#,
                n(bx + 8.0),
                n(ry),
                escape_xml(&series.color)
            );
            let _ = write!(
                s,
                r##"<text x="{}" y="{}" font-size="12" fill="#2A3F5F">{}</text>"##,
                n(bx + 26.0),
                n(ry + 10.0),
                escape_xml(&series.legend)
            );
        }
    }

    s.push_str("</svg>");
    s
}

/// Escape text for use in SVG character data and attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn n(v: f64) -> String {
    format!("{v:.2}")
}

fn fmt_tick(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v:.1}")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/chart/svg.rs"]
mod tests;
