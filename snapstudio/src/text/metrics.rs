//! The text-engine collaborator seam.

use tiny_skia::{Color, Paint, Pixmap, Rect, Transform};

/// A font request: family name and point size.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// Font family, resolved by the engine (e.g. "system-ui").
    pub family: String,
    /// Size in pixels.
    pub size: f32,
}

impl FontSpec {
    /// Create a font spec.
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

/// Measured extent of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextSize {
    /// Advance width in pixels.
    pub width: f32,
    /// Line height in pixels.
    pub height: f32,
}

/// Measures and paints single-line text.
///
/// Implementations must be deterministic: the measurement cache assumes the
/// same `(text, font)` pair always measures the same. Painting places the
/// text's top-left corner at `origin`; baseline handling is the engine's
/// concern.
pub trait TextEngine: Send + Sync {
    /// Measure one line of text.
    fn measure(&self, text: &str, font: &FontSpec) -> TextSize;

    /// Paint one line of text onto the pixmap.
    fn paint(&self, pixmap: &mut Pixmap, text: &str, origin: (f32, f32), font: &FontSpec, color: Color);
}

/// Deterministic engine with fixed per-character advance.
///
/// Every character advances `0.6 × size` and lines are `1.2 × size` tall.
/// Painting fills the measured box with the requested color, which keeps
/// composited output visibly different when a label is added. Intended for
/// tests and headless environments without system fonts.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvanceEngine;

impl FixedAdvanceEngine {
    const ADVANCE_EM: f32 = 0.6;
    const LINE_EM: f32 = 1.2;
}

impl TextEngine for FixedAdvanceEngine {
    fn measure(&self, text: &str, font: &FontSpec) -> TextSize {
        TextSize {
            width: text.chars().count() as f32 * font.size * Self::ADVANCE_EM,
            height: font.size * Self::LINE_EM,
        }
    }

    fn paint(&self, pixmap: &mut Pixmap, text: &str, origin: (f32, f32), font: &FontSpec, color: Color) {
        let size = self.measure(text, font);
        if size.width <= 0.0 {
            return;
        }
        let Some(rect) = Rect::from_xywh(origin.0, origin.1, size.width, size.height) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = true;
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_advance_scales_with_length() {
        let engine = FixedAdvanceEngine;
        let font = FontSpec::new("test", 10.0);
        let short = engine.measure("ab", &font);
        let long = engine.measure("abcd", &font);
        assert_eq!(long.width, short.width * 2.0);
        assert_eq!(long.height, short.height);
    }

    #[test]
    fn test_fixed_advance_empty_text() {
        let engine = FixedAdvanceEngine;
        let font = FontSpec::new("test", 10.0);
        assert_eq!(engine.measure("", &font).width, 0.0);
    }

    #[test]
    fn test_paint_marks_pixels() {
        let engine = FixedAdvanceEngine;
        let font = FontSpec::new("test", 10.0);
        let mut pixmap = Pixmap::new(64, 64).unwrap();
        engine.paint(
            &mut pixmap,
            "hi",
            (4.0, 4.0),
            &font,
            Color::from_rgba8(255, 255, 255, 255),
        );
        assert!(pixmap.data().iter().any(|&b| b != 0));
    }
}
