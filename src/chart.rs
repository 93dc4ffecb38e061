// Pie chart model and renderers
//
// Geometry follows the usual plotting convention: the first wedge starts at
// 12 o'clock (90 degrees) and wedges proceed counter-clockwise. The same model
// feeds the SVG/PNG export and the terminal canvas.

use crate::db::CategoryTotal;
use crate::error::ChartError;
use std::fmt::Write as _;
use std::sync::Arc;

pub const CHART_TITLE: &str = "Expense Distribution";

/// Width and height of the exported image, in pixels
pub const CHART_SIZE: u32 = 400;

/// Angle of the first wedge's leading edge, in degrees
pub const START_ANGLE: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Ten-colour categorical palette, cycled when there are more categories
pub const PALETTE: [Rgb; 10] = [
    Rgb(31, 119, 180),
    Rgb(255, 127, 14),
    Rgb(44, 160, 44),
    Rgb(214, 39, 40),
    Rgb(148, 103, 189),
    Rgb(140, 86, 75),
    Rgb(227, 119, 194),
    Rgb(127, 127, 127),
    Rgb(188, 189, 34),
    Rgb(23, 190, 207),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub value: f64,
    /// Share of the whole pie, 0.0..=1.0
    pub fraction: f64,
    /// Leading edge, degrees counter-clockwise from 3 o'clock
    pub start_angle: f64,
    pub end_angle: f64,
    pub color: Rgb,
}

impl Slice {
    /// Percentage label, one decimal place ("42.9%")
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.fraction * 100.0)
    }

    pub fn mid_angle(&self) -> f64 {
        (self.start_angle + self.end_angle) / 2.0
    }

    /// Position of the trailing edge as a fraction of a full turn from the start angle
    fn end_offset(&self) -> f64 {
        (self.end_angle - START_ANGLE) / 360.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    pub title: String,
    pub slices: Vec<Slice>,
}

impl PieChart {
    /// One slice per total, in the given order
    pub fn from_totals(title: &str, totals: &[CategoryTotal]) -> Result<Self, ChartError> {
        if totals.is_empty() {
            return Err(ChartError::Empty);
        }

        if let Some(bad) = totals.iter().find(|t| !t.total.is_finite() || t.total < 0.0) {
            return Err(ChartError::InvalidWedge {
                category: bad.category.clone(),
                value: bad.total,
            });
        }

        let sum: f64 = totals.iter().map(|t| t.total).sum();
        if sum <= 0.0 {
            return Err(ChartError::ZeroTotal);
        }

        let mut slices = Vec::with_capacity(totals.len());
        let mut offset = 0.0;

        for (i, total) in totals.iter().enumerate() {
            let fraction = total.total / sum;
            slices.push(Slice {
                label: total.category.clone(),
                value: total.total,
                fraction,
                start_angle: START_ANGLE + 360.0 * offset,
                end_angle: START_ANGLE + 360.0 * (offset + fraction),
                color: PALETTE[i % PALETTE.len()],
            });
            offset += fraction;
        }

        Ok(Self {
            title: title.to_string(),
            slices,
        })
    }

    pub fn total(&self) -> f64 {
        self.slices.iter().map(|s| s.value).sum()
    }

    /// Index of the slice covering point (x, y) of the unit disc, if any
    pub fn slice_at(&self, x: f64, y: f64) -> Option<usize> {
        if x * x + y * y > 1.0 {
            return None;
        }

        let angle = y.atan2(x).to_degrees();
        let mut offset = (angle - START_ANGLE).rem_euclid(360.0) / 360.0;
        if offset >= 1.0 {
            offset = 0.0;
        }

        self.slices
            .iter()
            .position(|s| offset < s.end_offset())
            .or_else(|| self.slices.iter().rposition(|s| s.fraction > 0.0))
    }

    /// Standalone SVG document of the chart
    pub fn render_svg(&self) -> String {
        let size = CHART_SIZE as f64;
        let (cx, cy) = (size / 2.0, size / 2.0 + 15.0);
        let radius = size * 0.35;

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{0}" height="{0}" viewBox="0 0 {0} {0}">"#,
            CHART_SIZE
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
        let _ = writeln!(
            svg,
            r#"<text x="{:.2}" y="30" text-anchor="middle" font-family="sans-serif" font-size="16">{}</text>"#,
            cx,
            escape_xml(&self.title)
        );

        for slice in &self.slices {
            let fill = slice.color.hex();
            if slice.fraction >= 1.0 {
                let _ = writeln!(
                    svg,
                    r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}"/>"#,
                    cx, cy, radius, fill
                );
            } else if slice.fraction > 0.0 {
                let (x1, y1) = polar(cx, cy, radius, slice.start_angle);
                let (x2, y2) = polar(cx, cy, radius, slice.end_angle);
                let large_arc = if slice.fraction > 0.5 { 1 } else { 0 };
                // sweep-flag 0: counter-clockwise on screen
                let _ = writeln!(
                    svg,
                    r#"<path d="M {:.2} {:.2} L {:.2} {:.2} A {:.2} {:.2} 0 {} 0 {:.2} {:.2} Z" fill="{}"/>"#,
                    cx, cy, x1, y1, radius, radius, large_arc, x2, y2, fill
                );
            }
        }

        for slice in &self.slices {
            let mid = slice.mid_angle();

            let (lx, ly) = polar(cx, cy, radius * 1.1, mid);
            let cos = mid.to_radians().cos();
            let anchor = if cos.abs() < 0.1 {
                "middle"
            } else if cos > 0.0 {
                "start"
            } else {
                "end"
            };
            let _ = writeln!(
                svg,
                r#"<text x="{:.2}" y="{:.2}" text-anchor="{}" dominant-baseline="middle" font-family="sans-serif" font-size="12">{}</text>"#,
                lx,
                ly,
                anchor,
                escape_xml(&slice.label)
            );

            let (px, py) = polar(cx, cy, radius * 0.6, mid);
            let _ = writeln!(
                svg,
                r#"<text x="{:.2}" y="{:.2}" text-anchor="middle" dominant-baseline="middle" font-family="sans-serif" font-size="12">{}</text>"#,
                px,
                py,
                slice.percent_label()
            );
        }

        svg.push_str("</svg>\n");
        svg
    }

    /// Rasterise the SVG rendition and encode it as PNG
    pub fn render_png(&self) -> Result<Vec<u8>, ChartError> {
        let svg = self.render_svg();

        let mut opts = usvg::Options::default();
        let mut fontdb = fontdb::Database::new();
        fontdb.load_system_fonts();
        opts.fontdb = Arc::new(fontdb);

        let tree = usvg::Tree::from_str(&svg, &opts)
            .map_err(|e| ChartError::Render(format!("SVG parsing error: {}", e)))?;

        let size = tree.size();
        let mut pixmap = tiny_skia::Pixmap::new(
            size.width().ceil() as u32,
            size.height().ceil() as u32,
        )
        .ok_or_else(|| ChartError::Render("invalid image size".to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| ChartError::Render(format!("PNG encoding error: {}", e)))
    }
}

/// Point on a circle, screen coordinates (y grows downwards)
fn polar(cx: f64, cy: f64, r: f64, angle_deg: f64) -> (f64, f64) {
    let rad = angle_deg.to_radians();
    (cx + r * rad.cos(), cy - r * rad.sin())
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
