//! Overlay colors, fonts, and layout constants.

use crate::text::FontSpec;

/// Default font family handed to the text engine.
pub const DEFAULT_FONT_FAMILY: &str = "system-ui";

/// Visual parameters for the overlay compositor.
///
/// The defaults match the snapshot look: faint grid and chip backgrounds,
/// near-opaque crosshair, 14 px outer padding.
#[derive(Debug, Clone)]
pub struct OverlayTheme {
    /// Grid line opacity, 0..=1.
    pub grid_alpha: f32,
    /// Chip and caption box opacity, 0..=1.
    pub chip_alpha: f32,
    /// Crosshair opacity, 0..=1.
    pub crosshair_alpha: f32,
    /// Outer padding from the image edge, in pixels.
    pub pad: f32,
    /// Inner padding of chip and caption boxes, in pixels.
    pub box_pad: f32,
    /// Corner radius of chip and caption boxes, in pixels.
    pub corner_radius: f32,
    /// Absolute cap on the address chip width, in pixels.
    pub chip_max_width: f32,
    /// Vertical offset keeping the caption clear of the scale bar.
    pub caption_offset_y: f32,
    /// Address chip font.
    pub chip_font: FontSpec,
    /// Caption font.
    pub caption_font: FontSpec,
    /// Scale bar label font.
    pub scale_font: FontSpec,
    /// Orientation marker "N" font.
    pub north_font: FontSpec,
}

impl Default for OverlayTheme {
    fn default() -> Self {
        Self {
            grid_alpha: 0.10,
            chip_alpha: 0.06,
            crosshair_alpha: 0.85,
            pad: 14.0,
            box_pad: 8.0,
            corner_radius: 8.0,
            chip_max_width: 320.0,
            caption_offset_y: 26.0,
            chip_font: FontSpec::new(DEFAULT_FONT_FAMILY, 12.0),
            caption_font: FontSpec::new(DEFAULT_FONT_FAMILY, 12.0),
            scale_font: FontSpec::new(DEFAULT_FONT_FAMILY, 13.0),
            north_font: FontSpec::new(DEFAULT_FONT_FAMILY, 14.0),
        }
    }
}
