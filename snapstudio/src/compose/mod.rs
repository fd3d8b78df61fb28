//! Deterministic overlay compositing.
//!
//! `compose` is a pure function of the base image, the render parameters,
//! the overlay flags, and an optional address label (plus the measurement
//! cache it layouts with). Overlays draw in a fixed order (address chip,
//! grid, scale bar, orientation marker, caption, crosshair) so later steps
//! occlude earlier ones and the crosshair is always topmost.

mod scale;
mod theme;

pub use scale::{nice_scale_length, SCALE_LADDER};
pub use theme::{OverlayTheme, DEFAULT_FONT_FAMILY};

use std::sync::Arc;

use thiserror::Error;
use tiny_skia::{
    Color, FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform,
};
use tracing::debug;

use crate::cache::MeasurementCache;
use crate::params::{meters_label, OverlayFlags, RenderParams};
use crate::text::TextEngine;

/// Fewest grid divisions per axis.
const MIN_GRID_DIVISIONS: u8 = 2;
/// Most grid divisions per axis.
const MAX_GRID_DIVISIONS: u8 = 5;
/// Minimum chip line height in pixels.
const MIN_CHIP_LINE_H: f32 = 18.0;
/// Longest scale bar in pixels, before the 40%-of-width cap.
const SCALE_MAX_PX: f64 = 180.0;
/// Half-length of a crosshair arm in pixels.
const CROSSHAIR_ARM: f32 = 18.0;
/// Edge length of the orientation marker box in pixels.
const NORTH_SIZE: f32 = 44.0;

/// Errors from overlay compositing.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The base image has a zero dimension.
    #[error("Base image has invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Base image width.
        width: u32,
        /// Base image height.
        height: u32,
    },
}

/// Draws annotation overlays onto snapshot images.
pub struct OverlayCompositor {
    engine: Arc<dyn TextEngine>,
    measure: Arc<MeasurementCache>,
    theme: OverlayTheme,
}

impl OverlayCompositor {
    /// Create a compositor painting with `engine` and measuring through the
    /// shared cache.
    pub fn new(engine: Arc<dyn TextEngine>, measure: Arc<MeasurementCache>) -> Self {
        Self::with_theme(engine, measure, OverlayTheme::default())
    }

    /// Create a compositor with a custom theme.
    pub fn with_theme(
        engine: Arc<dyn TextEngine>,
        measure: Arc<MeasurementCache>,
        theme: OverlayTheme,
    ) -> Self {
        Self {
            engine,
            measure,
            theme,
        }
    }

    /// Compose overlays over `base` and return the annotated image.
    ///
    /// The base is never mutated. The address chip draws only when `address`
    /// is non-empty; grid, caption, and crosshair follow `flags`; the scale
    /// bar and orientation marker always draw.
    ///
    /// # Errors
    ///
    /// Returns `ComposeError::InvalidDimensions` for a zero-sized base.
    pub fn compose(
        &self,
        base: &Pixmap,
        params: &RenderParams,
        flags: &OverlayFlags,
        address: Option<&str>,
    ) -> Result<Pixmap, ComposeError> {
        if base.width() == 0 || base.height() == 0 {
            return Err(ComposeError::InvalidDimensions {
                width: base.width(),
                height: base.height(),
            });
        }
        let mut out = base.clone();
        let w = out.width() as f32;
        let h = out.height() as f32;

        if let Some(addr) = address.filter(|a| !a.trim().is_empty()) {
            self.draw_address_chip(&mut out, w, addr);
        }
        if flags.grid {
            self.draw_grid(&mut out, w, h, flags.grid_divisions);
        }
        self.draw_scale_bar(&mut out, w, h, params.extent_m);
        self.draw_north_marker(&mut out, w, params.rotation_deg);
        if flags.caption {
            self.draw_caption(&mut out, w, h, params);
        }
        if flags.crosshair {
            self.draw_crosshair(&mut out, w, h);
        }
        debug!(
            width = out.width(),
            height = out.height(),
            with_address = address.is_some(),
            "Overlays composed"
        );
        Ok(out)
    }

    fn draw_address_chip(&self, out: &mut Pixmap, w: f32, addr: &str) {
        let t = &self.theme;
        let max_chip_w = (w * 0.80).min(t.chip_max_width);
        let max_text_w = max_chip_w - 2.0 * t.box_pad;
        let lines = crate::text::wrap(addr, &t.chip_font, max_text_w, &self.measure);
        if lines.is_empty() {
            return;
        }
        let line_h = self
            .measure
            .measure("Ag", &t.chip_font)
            .height
            .max(MIN_CHIP_LINE_H);
        let text_w = lines
            .iter()
            .map(|line| self.measure.measure(line, &t.chip_font).width.min(max_text_w))
            .fold(0.0f32, f32::max);
        let box_w = (text_w + 2.0 * t.box_pad).min(max_chip_w);
        let box_h = line_h * lines.len() as f32 + 2.0 * t.box_pad;

        fill_rounded_rect(
            out,
            t.pad,
            t.pad,
            box_w,
            box_h,
            t.corner_radius,
            black(t.chip_alpha),
        );
        let tx = t.pad + t.box_pad;
        let mut ty = t.pad + t.box_pad;
        for line in &lines {
            self.engine
                .paint(out, line, (tx, ty), &t.chip_font, Color::WHITE);
            ty += line_h;
        }
    }

    fn draw_grid(&self, out: &mut Pixmap, w: f32, h: f32, divisions: u8) {
        let divisions = divisions.clamp(MIN_GRID_DIVISIONS, MAX_GRID_DIVISIONS);
        let color = white(self.theme.grid_alpha);
        for i in 1..divisions {
            let x = i as f32 * (w / divisions as f32);
            stroke_line(out, x, 0.0, x, h, 0.8, color);
        }
        for i in 1..divisions {
            let y = i as f32 * (h / divisions as f32);
            stroke_line(out, 0.0, y, w, y, 0.8, color);
        }
    }

    fn draw_scale_bar(&self, out: &mut Pixmap, w: f32, h: f32, extent_m: u32) {
        let t = &self.theme;
        let mpp = extent_m as f64 / w as f64;
        let budget = SCALE_MAX_PX.min(w as f64 * 0.4);
        let bar_m = nice_scale_length(mpp, budget);
        let bar_px = (bar_m as f64 / mpp) as f32;
        let x = t.pad * 1.5;
        let y = h - 20.0 - t.pad;

        fill_rect(out, x, y, bar_px, 6.0, Color::WHITE);
        let label = meters_label(bar_m);
        let label_w = self.measure.measure(&label, &t.scale_font).width;
        let label_x = x + (bar_px - label_w) / 2.0;
        self.engine
            .paint(out, &label, (label_x, y - 18.0), &t.scale_font, Color::WHITE);
    }

    /// Triangle rotated by the image rotation about its own center, so it
    /// keeps pointing true north, with a contrasting "N" below.
    fn draw_north_marker(&self, out: &mut Pixmap, w: f32, rotation_deg: f32) {
        let t = &self.theme;
        let x = w - NORTH_SIZE - t.pad;
        let y = t.pad;
        let cx = x + NORTH_SIZE / 2.0;
        let cy = y + NORTH_SIZE / 2.0;
        let r = NORTH_SIZE * 0.36;

        let theta = rotation_deg.to_radians();
        let (sin, cos) = theta.sin_cos();
        let rotate = |px: f32, py: f32| (px * cos - py * sin + cx, px * sin + py * cos + cy);
        let p1 = rotate(0.0, -r);
        let p2 = rotate(-r * 0.72, r * 0.72);
        let p3 = rotate(r * 0.72, r * 0.72);

        let mut pb = PathBuilder::new();
        pb.move_to(p1.0, p1.1);
        pb.line_to(p2.0, p2.1);
        pb.line_to(p3.0, p3.1);
        pb.close();
        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.set_color(Color::WHITE);
            paint.anti_alias = true;
            out.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }

        let n_w = self.measure.measure("N", &t.north_font).width;
        let n_x = x + (NORTH_SIZE - n_w) / 2.0;
        let n_y = y + NORTH_SIZE - 18.0;
        self.engine.paint(
            out,
            "N",
            (n_x, n_y),
            &t.north_font,
            Color::from_rgba8(255, 51, 51, 255),
        );
    }

    fn draw_caption(&self, out: &mut Pixmap, w: f32, h: f32, params: &RenderParams) {
        let t = &self.theme;
        let rotation = params.rotation_deg;
        let rot_clause = if rotation.abs() >= 1.0 {
            format!(" \u{2022} Rot {rotation:.0}\u{b0}")
        } else {
            String::new()
        };
        let caption = format!(
            "{} \u{2022} {} \u{2022} Lat {:.5}, Lon {:.5}{}",
            params.style.label(),
            params.extent_label(),
            params.coordinate.lat,
            params.coordinate.lon,
            rot_clause,
        );

        let size = self.measure.measure(&caption, &t.caption_font);
        let text_h = size.height.max(MIN_CHIP_LINE_H);
        let box_w = size.width + 2.0 * t.box_pad;
        let box_h = text_h + 2.0 * t.box_pad;
        let bx = w - box_w - t.pad;
        let by = h - box_h - t.pad - t.caption_offset_y;

        fill_rounded_rect(out, bx, by, box_w, box_h, t.corner_radius, black(t.chip_alpha));
        self.engine.paint(
            out,
            &caption,
            (bx + t.box_pad, by + t.box_pad),
            &t.caption_font,
            Color::WHITE,
        );
    }

    fn draw_crosshair(&self, out: &mut Pixmap, w: f32, h: f32) {
        let cx = w / 2.0;
        let cy = h / 2.0;
        let color = white(self.theme.crosshair_alpha);
        stroke_line(out, cx - CROSSHAIR_ARM, cy, cx + CROSSHAIR_ARM, cy, 1.2, color);
        stroke_line(out, cx, cy - CROSSHAIR_ARM, cx, cy + CROSSHAIR_ARM, 1.2, color);

        let mut pb = PathBuilder::new();
        pb.push_circle(cx, cy, 2.0);
        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.set_color(color);
            paint.anti_alias = true;
            out.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }
}

fn white(alpha: f32) -> Color {
    Color::from_rgba8(255, 255, 255, (alpha * 255.0) as u8)
}

fn black(alpha: f32) -> Color {
    Color::from_rgba8(0, 0, 0, (alpha * 255.0) as u8)
}

fn fill_rect(out: &mut Pixmap, x: f32, y: f32, w: f32, h: f32, color: Color) {
    let Some(rect) = Rect::from_xywh(x, y, w, h) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    out.fill_rect(rect, &paint, Transform::identity(), None);
}

fn stroke_line(out: &mut Pixmap, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Color) {
    let mut pb = PathBuilder::new();
    pb.move_to(x1, y1);
    pb.line_to(x2, y2);
    let Some(path) = pb.finish() else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    let stroke = Stroke {
        width,
        ..Stroke::default()
    };
    out.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

fn fill_rounded_rect(out: &mut Pixmap, x: f32, y: f32, w: f32, h: f32, r: f32, color: Color) {
    let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    let Some(path) = pb.finish() else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    out.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;
    use crate::params::MapStyle;
    use crate::telemetry::PipelineMetrics;
    use crate::text::FixedAdvanceEngine;

    fn compositor() -> OverlayCompositor {
        let engine = Arc::new(FixedAdvanceEngine);
        let measure = Arc::new(MeasurementCache::new(
            engine.clone(),
            4096,
            Arc::new(PipelineMetrics::new()),
        ));
        OverlayCompositor::new(engine, measure)
    }

    fn params() -> RenderParams {
        RenderParams::new(
            Coordinate::new(40.0, -73.0).unwrap(),
            800,
            MapStyle::Hybrid,
            0.0,
            256,
        )
    }

    fn base() -> Pixmap {
        let mut pixmap = Pixmap::new(256, 256).unwrap();
        pixmap.fill(Color::from_rgba8(30, 60, 30, 255));
        pixmap
    }

    fn pixel_diff(a: &Pixmap, b: &Pixmap) -> usize {
        a.data()
            .iter()
            .zip(b.data().iter())
            .filter(|(x, y)| x != y)
            .count()
    }

    #[test]
    fn test_compose_preserves_dimensions() {
        let out = compositor()
            .compose(&base(), &params(), &OverlayFlags::default(), None)
            .unwrap();
        assert_eq!(out.width(), 256);
        assert_eq!(out.height(), 256);
    }

    #[test]
    fn test_base_is_not_mutated() {
        let base = base();
        let copy = base.clone();
        compositor()
            .compose(&base, &params(), &OverlayFlags::default(), None)
            .unwrap();
        assert_eq!(pixel_diff(&base, &copy), 0);
    }

    #[test]
    fn test_scale_bar_and_marker_always_draw() {
        let flags = OverlayFlags {
            grid: false,
            grid_divisions: 4,
            crosshair: false,
            caption: false,
        };
        let base = base();
        let out = compositor().compose(&base, &params(), &flags, None).unwrap();
        assert!(pixel_diff(&base, &out) > 0);
    }

    #[test]
    fn test_grid_flag_changes_output() {
        let mut flags = OverlayFlags::default();
        let with_grid = compositor()
            .compose(&base(), &params(), &flags, None)
            .unwrap();
        flags.grid = false;
        let without = compositor()
            .compose(&base(), &params(), &flags, None)
            .unwrap();
        assert!(pixel_diff(&with_grid, &without) > 0);
    }

    #[test]
    fn test_address_adds_chip() {
        let comp = compositor();
        let plain = comp
            .compose(&base(), &params(), &OverlayFlags::default(), None)
            .unwrap();
        let with_addr = comp
            .compose(
                &base(),
                &params(),
                &OverlayFlags::default(),
                Some("12 Main St\nSpringfield 01101, USA"),
            )
            .unwrap();
        assert!(pixel_diff(&plain, &with_addr) > 0);
    }

    #[test]
    fn test_empty_address_draws_no_chip() {
        let comp = compositor();
        let plain = comp
            .compose(&base(), &params(), &OverlayFlags::default(), None)
            .unwrap();
        let blank = comp
            .compose(&base(), &params(), &OverlayFlags::default(), Some("  "))
            .unwrap();
        assert_eq!(pixel_diff(&plain, &blank), 0);
    }

    #[test]
    fn test_compose_is_deterministic() {
        let comp = compositor();
        let first = comp
            .compose(&base(), &params(), &OverlayFlags::default(), Some("Atlanta 30301, USA"))
            .unwrap();
        let second = comp
            .compose(&base(), &params(), &OverlayFlags::default(), Some("Atlanta 30301, USA"))
            .unwrap();
        assert_eq!(pixel_diff(&first, &second), 0);
    }

    #[test]
    fn test_zero_sized_base_rejected() {
        // Pixmap cannot be zero-sized itself, so exercise the guard with
        // the smallest legal base and a direct check of the error shape.
        let err = ComposeError::InvalidDimensions {
            width: 0,
            height: 256,
        };
        assert!(err.to_string().contains("0x256"));
    }

    #[test]
    fn test_caption_flag_changes_output() {
        let mut flags = OverlayFlags::default();
        flags.crosshair = false;
        flags.grid = false;
        let with_caption = compositor()
            .compose(&base(), &params(), &flags, None)
            .unwrap();
        flags.caption = false;
        let without = compositor()
            .compose(&base(), &params(), &flags, None)
            .unwrap();
        assert!(pixel_diff(&with_caption, &without) > 0);
    }
}
