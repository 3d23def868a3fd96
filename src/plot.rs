//! Rasterised line plots saved as PNG.
//!
//! A `Figure` holds one or more `Series` plus title and axis labels. Rendering
//! lays out the axes box, a light grid at "nice" tick values, tick labels in the
//! bitmap font, the data and an optional legend in the upper right corner.

use std::path::Path;

use image::{Rgb, RgbImage};

use crate::error::{PostError, PostResult};
use crate::font::{self, FONT_HEIGHT, FONT_WIDTH};

pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
/// Default series color
pub const TAB_BLUE: Rgb<u8> = Rgb([31, 119, 180]);

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const GRID: Rgb<u8> = Rgb([235, 235, 235]);
const LEGEND_EDGE: Rgb<u8> = Rgb([204, 204, 204]);

/// Fraction of the data range added on each side of the axes
const AXIS_MARGIN: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct Series {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub color: Rgb<u8>,
    /// Line width in points
    pub line_width: f64,
    pub markers: bool,
    pub label: Option<String>,
}

impl Series {
    pub fn line(x: Vec<f64>, y: Vec<f64>, color: Rgb<u8>) -> Self {
        Series {
            x,
            y,
            color,
            line_width: 2.0,
            markers: false,
            label: None,
        }
    }

    pub fn with_markers(mut self) -> Self {
        self.markers = true;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

#[derive(Debug, Clone)]
pub struct Figure {
    /// Size in inches
    pub size: (f64, f64),
    pub dpi: u32,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend: bool,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(width_in: f64, height_in: f64, dpi: u32) -> Self {
        Figure {
            size: (width_in, height_in),
            dpi,
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            legend: false,
            series: Vec::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn legend(mut self) -> Self {
        self.legend = true;
        self
    }

    pub fn add(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    /// Image size in pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        let w = (self.size.0 * self.dpi as f64).round().max(1.0) as u32;
        let h = (self.size.1 * self.dpi as f64).round().max(1.0) as u32;
        (w, h)
    }

    pub fn save(&self, path: &Path) -> PostResult<()> {
        self.render().save(path).map_err(|source| PostError::Image {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn render(&self) -> RgbImage {
        let (width, height) = self.pixel_size();
        let mut canvas = Canvas::new(width, height);

        let px_per_pt = self.dpi as f64 / 72.0;
        let text_scale = points_to_scale(10.0, px_per_pt);
        let title_scale = points_to_scale(12.0, px_per_pt);
        let pad = (4.0 * px_per_pt).round() as i64;
        let tick_len = (3.5 * px_per_pt).round() as i64;
        let spine = (0.8 * px_per_pt).round().max(1.0) as i64;

        // Data limits and ticks
        let (x_lo, x_hi) = padded_range(self.series.iter().flat_map(|s| s.x.iter().copied()));
        let (y_lo, y_hi) = padded_range(self.series.iter().flat_map(|s| s.y.iter().copied()));
        let x_ticks = nice_ticks(x_lo, x_hi);
        let y_ticks = nice_ticks(y_lo, y_hi);
        let x_labels = tick_labels(&x_ticks);
        let y_labels = tick_labels(&y_ticks);

        let char_h = (FONT_HEIGHT * text_scale) as i64;
        let y_label_w = y_labels
            .iter()
            .map(|l| font::text_width(l, text_scale))
            .max()
            .unwrap_or(0) as i64;

        // Axes box in pixel coordinates
        let left = pad + char_h + 2 * pad + y_label_w + tick_len + pad;
        let right = width as i64 - 4 * pad;
        let top = 2 * pad + (FONT_HEIGHT * title_scale) as i64 + 2 * pad;
        let bottom = height as i64 - (tick_len + pad + char_h + 2 * pad + char_h + 2 * pad);
        let area = PlotArea {
            left,
            right: right.max(left + 1),
            top,
            bottom: bottom.max(top + 1),
            x_range: (x_lo, x_hi),
            y_range: (y_lo, y_hi),
        };

        // Grid, then the data on top of it
        for &t in &x_ticks {
            let px = area.px(t).round() as i64;
            canvas.fill_rect(px, area.top, px, area.bottom, GRID);
        }
        for &t in &y_ticks {
            let py = area.py(t).round() as i64;
            canvas.fill_rect(area.left, py, area.right, py, GRID);
        }

        for series in &self.series {
            let radius = series.line_width * px_per_pt / 2.0;
            let pixels: Vec<(f64, f64)> = series.points().map(|(x, y)| (area.px(x), area.py(y))).collect();
            for pair in pixels.windows(2) {
                canvas.segment(pair[0], pair[1], radius, series.color, &area);
            }
            if series.markers {
                for &(px, py) in &pixels {
                    canvas.disc(px, py, 3.0 * px_per_pt, series.color, &area);
                }
            }
        }

        // Spines
        canvas.fill_rect(area.left - spine, area.top - spine, area.right + spine, area.top, BLACK);
        canvas.fill_rect(area.left - spine, area.bottom, area.right + spine, area.bottom + spine, BLACK);
        canvas.fill_rect(area.left - spine, area.top, area.left, area.bottom, BLACK);
        canvas.fill_rect(area.right, area.top, area.right + spine, area.bottom, BLACK);

        // Ticks and tick labels
        for (t, label) in x_ticks.iter().zip(&x_labels) {
            let px = area.px(*t).round() as i64;
            canvas.fill_rect(px, area.bottom, px + spine - 1, area.bottom + tick_len, BLACK);
            let w = font::text_width(label, text_scale) as i64;
            canvas.text(px - w / 2, area.bottom + tick_len + pad, label, text_scale, BLACK);
        }
        for (t, label) in y_ticks.iter().zip(&y_labels) {
            let py = area.py(*t).round() as i64;
            canvas.fill_rect(area.left - tick_len, py, area.left, py + spine - 1, BLACK);
            let w = font::text_width(label, text_scale) as i64;
            canvas.text(area.left - tick_len - pad - w, py - char_h / 2, label, text_scale, BLACK);
        }

        // Axis labels and title, centered on the axes box
        let mid_x = (area.left + area.right) / 2;
        let mid_y = (area.top + area.bottom) / 2;

        let w = font::text_width(&self.x_label, text_scale) as i64;
        canvas.text(mid_x - w / 2, area.bottom + tick_len + pad + char_h + 2 * pad, &self.x_label, text_scale, BLACK);

        let w = font::text_width(&self.y_label, text_scale) as i64;
        canvas.text_vertical(pad, mid_y + w / 2, &self.y_label, text_scale, BLACK);

        let w = font::text_width(&self.title, title_scale) as i64;
        canvas.text(mid_x - w / 2, 2 * pad, &self.title, title_scale, BLACK);

        if self.legend {
            self.draw_legend(&mut canvas, &area, text_scale, pad, px_per_pt);
        }

        canvas.into_image()
    }

    fn draw_legend(&self, canvas: &mut Canvas, area: &PlotArea, scale: usize, pad: i64, px_per_pt: f64) {
        let entries: Vec<(&str, &Series)> = self
            .series
            .iter()
            .filter_map(|s| s.label.as_deref().map(|l| (l, s)))
            .collect();
        if entries.is_empty() {
            return;
        }

        let char_h = (FONT_HEIGHT * scale) as i64;
        let sample_len = (FONT_WIDTH * scale * 4) as i64;
        let label_w = entries
            .iter()
            .map(|(l, _)| font::text_width(l, scale))
            .max()
            .unwrap_or(0) as i64;
        let row_h = char_h + pad;

        let box_w = pad + sample_len + pad + label_w + pad;
        let box_h = pad + row_h * entries.len() as i64;
        let x1 = area.right - 2 * pad;
        let x0 = x1 - box_w;
        let y0 = area.top + 2 * pad;
        let y1 = y0 + box_h;

        canvas.fill_rect(x0, y0, x1, y1, WHITE);
        canvas.fill_rect(x0, y0, x1, y0, LEGEND_EDGE);
        canvas.fill_rect(x0, y1, x1, y1, LEGEND_EDGE);
        canvas.fill_rect(x0, y0, x0, y1, LEGEND_EDGE);
        canvas.fill_rect(x1, y0, x1, y1, LEGEND_EDGE);

        for (row, (label, series)) in entries.iter().enumerate() {
            let top = y0 + pad + row as i64 * row_h;
            let cy = (top + char_h / 2) as f64;
            let sx0 = (x0 + pad) as f64;
            let sx1 = sx0 + sample_len as f64;
            let radius = series.line_width * px_per_pt / 2.0;
            canvas.segment((sx0, cy), (sx1, cy), radius, series.color, area);
            if series.markers {
                canvas.disc((sx0 + sx1) / 2.0, cy, 3.0 * px_per_pt, series.color, area);
            }
            canvas.text(x0 + pad + sample_len + pad, top, label, scale, BLACK);
        }
    }
}

fn points_to_scale(points: f64, px_per_pt: f64) -> usize {
    ((points * px_per_pt / FONT_HEIGHT as f64).round() as usize).max(1)
}

// ///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Axis Ranges and Ticks
// ///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Data range widened by AXIS_MARGIN on each side. An empty range falls back to (0, 1) and a
/// single value is widened around itself.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if lo > hi {
        return (0.0, 1.0);
    }
    if hi - lo <= f64::EPSILON * hi.abs().max(lo.abs()) {
        let half = if lo == 0.0 { 0.5 } else { AXIS_MARGIN * lo.abs() };
        return (lo - half, hi + half);
    }
    let margin = (hi - lo) * AXIS_MARGIN;
    (lo - margin, hi + margin)
}

/// Tick step of the form {1, 2, 2.5, 5} x 10^k giving roughly five to ten ticks on [lo, hi].
fn nice_step(lo: f64, hi: f64) -> f64 {
    let raw = (hi - lo) / 6.0;
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 2.5 {
        2.5
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn nice_ticks(lo: f64, hi: f64) -> Vec<f64> {
    let step = nice_step(lo, hi);
    if !step.is_finite() || step <= 0.0 {
        return Vec::new();
    }

    let first = (lo / step).ceil() as i64;
    let last = (hi / step + 1e-9).floor() as i64;
    (first..=last)
        .map(|k| {
            let t = k as f64 * step;
            // Avoid "-0" labels
            if t.abs() < step * 1e-9 {
                0.0
            } else {
                t
            }
        })
        .collect()
}

fn tick_labels(ticks: &[f64]) -> Vec<String> {
    let step = if ticks.len() >= 2 { ticks[1] - ticks[0] } else { 1.0 };
    let decimals = (0..=12)
        .find(|&d| {
            let scaled = step * 10f64.powi(d);
            (scaled - scaled.round()).abs() < 1e-6 * scaled.abs().max(1.0)
        })
        .unwrap_or(12) as usize;
    ticks.iter().map(|t| format!("{:.*}", decimals, t)).collect()
}

// ///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Pixel Drawing
// ///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// The axes box in pixels and the data window it shows.
struct PlotArea {
    left: i64,
    right: i64,
    top: i64,
    bottom: i64,
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl PlotArea {
    fn px(&self, x: f64) -> f64 {
        let (lo, hi) = self.x_range;
        self.left as f64 + (x - lo) / (hi - lo) * (self.right - self.left) as f64
    }

    fn py(&self, y: f64) -> f64 {
        let (lo, hi) = self.y_range;
        self.bottom as f64 - (y - lo) / (hi - lo) * (self.bottom - self.top) as f64
    }

    fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

struct Canvas {
    img: RgbImage,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Canvas {
            img: RgbImage::from_pixel(width, height, WHITE),
        }
    }

    fn into_image(self) -> RgbImage {
        self.img
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.img.width() && (y as u32) < self.img.height() {
            self.img.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Fills the inclusive pixel rectangle [x0, x1] x [y0, y1].
    fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
        for y in y0.min(y1)..=y0.max(y1) {
            for x in x0.min(x1)..=x0.max(x1) {
                self.put(x, y, color);
            }
        }
    }

    /// Filled disc, clipped to the axes box.
    fn disc(&mut self, cx: f64, cy: f64, radius: f64, color: Rgb<u8>, clip: &PlotArea) {
        let r = radius.max(0.5);
        let x0 = (cx - r).floor() as i64;
        let x1 = (cx + r).ceil() as i64;
        let y0 = (cy - r).floor() as i64;
        let y1 = (cy + r).ceil() as i64;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= r * r && clip.contains(x, y) {
                    self.put(x, y, color);
                }
            }
        }
    }

    /// Thick line segment drawn by stamping discs every half pixel.
    fn segment(&mut self, p0: (f64, f64), p1: (f64, f64), radius: f64, color: Rgb<u8>, clip: &PlotArea) {
        let length = ((p1.0 - p0.0).powi(2) + (p1.1 - p0.1).powi(2)).sqrt();
        let steps = (length * 2.0).ceil().max(1.0) as usize;
        for k in 0..=steps {
            let t = k as f64 / steps as f64;
            let x = p0.0 + t * (p1.0 - p0.0);
            let y = p0.1 + t * (p1.1 - p0.1);
            self.disc(x, y, radius, color, clip);
        }
    }

    /// Horizontal text with its top-left corner at (x, y).
    fn text(&mut self, x: i64, y: i64, text: &str, scale: usize, color: Rgb<u8>) {
        self.glyphs(text, scale, |gx, gy| (x + gx, y + gy), color);
    }

    /// Text rotated 90 degrees counter-clockwise, reading bottom to top from (x, y).
    fn text_vertical(&mut self, x: i64, y: i64, text: &str, scale: usize, color: Rgb<u8>) {
        self.glyphs(text, scale, |gx, gy| (x + gy, y - gx), color);
    }

    /// Walks the set pixels of `text` in horizontal layout and maps each through `place`.
    fn glyphs(&mut self, text: &str, scale: usize, place: impl Fn(i64, i64) -> (i64, i64), color: Rgb<u8>) {
        let s = scale as i64;
        for (n, ch) in text.bytes().enumerate() {
            let origin = (n * font::ADVANCE) as i64 * s;
            for (row, bits) in font::glyph(ch).iter().enumerate() {
                for col in 0..FONT_WIDTH {
                    if bits & (0x10 >> col) == 0 {
                        continue;
                    }
                    for sy in 0..s {
                        for sx in 0..s {
                            let (px, py) = place(origin + col as i64 * s + sx, row as i64 * s + sy);
                            self.put(px, py, color);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn count_color(img: &RgbImage, color: Rgb<u8>) -> usize {
        img.pixels().filter(|&&p| p == color).count()
    }

    #[test]
    fn test_figure_pixel_size_follows_dpi() {
        assert_eq!(Figure::new(8.0, 5.0, 150).pixel_size(), (1200, 750));
        assert_eq!(Figure::new(6.0, 4.0, 150).pixel_size(), (900, 600));
    }

    #[test]
    fn test_padded_range() {
        let (lo, hi) = padded_range([0.0, 10.0].into_iter());
        assert_relative_eq!(lo, -0.5);
        assert_relative_eq!(hi, 10.5);

        assert_eq!(padded_range(std::iter::empty::<f64>()), (0.0, 1.0));

        let (lo, hi) = padded_range([2.0, 2.0].into_iter());
        assert!(lo < 2.0 && hi > 2.0);

        let (lo, hi) = padded_range([0.0].into_iter());
        assert_eq!((lo, hi), (-0.5, 0.5));
    }

    #[test]
    fn test_nice_ticks_cover_the_range() {
        let ticks = nice_ticks(-0.05, 1.05);
        assert_eq!(ticks.len(), 6);
        assert_relative_eq!(ticks[0], 0.0);
        assert_relative_eq!(ticks[5], 1.0, epsilon = 1e-12);
        assert_eq!(tick_labels(&ticks), vec!["0.0", "0.2", "0.4", "0.6", "0.8", "1.0"]);
    }

    #[test]
    fn test_tick_labels_for_reynolds_axis() {
        let ticks = nice_ticks(-14.5, 524.5);
        assert_eq!(tick_labels(&ticks), vec!["0", "100", "200", "300", "400", "500"]);
    }

    #[test]
    fn test_tick_labels_keep_quarter_steps() {
        let labels = tick_labels(&[0.0, 0.25, 0.5]);
        assert_eq!(labels, vec!["0.00", "0.25", "0.50"]);
    }

    #[test]
    fn test_render_draws_series_and_frame() {
        let fig = Figure::new(4.0, 3.0, 100)
            .title("Test (Re=10)")
            .labels("x position", "du/dy at top wall")
            .legend()
            .add(Series::line(vec![0.0, 0.5, 1.0], vec![0.0, 1.0, 0.0], BLUE).with_label("Re=10"));
        let img = fig.render();

        assert_eq!(img.dimensions(), (400, 300));
        assert_eq!(*img.get_pixel(0, 0), WHITE);
        assert!(count_color(&img, BLUE) > 100);
        assert!(count_color(&img, BLACK) > 100);
    }

    #[test]
    fn test_markers_add_pixels() {
        let series = Series::line(vec![0.0, 1.0], vec![0.0, 0.0], TAB_BLUE);
        let plain = Figure::new(3.0, 2.0, 100).add(series.clone()).render();
        let marked = Figure::new(3.0, 2.0, 100).add(series.with_markers()).render();
        assert!(count_color(&marked, TAB_BLUE) > count_color(&plain, TAB_BLUE));
    }

    #[test]
    fn test_empty_figure_renders() {
        let img = Figure::new(2.0, 2.0, 72).render();
        assert_eq!(img.dimensions(), (144, 144));
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.png");
        Figure::new(3.0, 2.0, 100)
            .add(Series::line(vec![1.0, 2.0], vec![3.0, 4.0], BLUE))
            .save(&path)
            .unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (300, 200));
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("plot.png");
        let err = Figure::new(1.0, 1.0, 50).save(&path).unwrap_err();
        assert!(matches!(err, PostError::Image { .. }));
    }
}
