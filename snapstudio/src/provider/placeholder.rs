//! Flat placeholder tiles for offline and test use.

use tiny_skia::{Color, Pixmap};

use crate::coord::Coordinate;
use crate::params::MapStyle;
use crate::snapshot::{TileError, TileRenderer};

/// Renders a flat, style-tinted square instead of fetching imagery.
///
/// Useful when no network is available and in tests: renders are instant,
/// deterministic, and visually distinguishable per style.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderTileRenderer;

impl PlaceholderTileRenderer {
    fn fill_color(style: MapStyle) -> Color {
        match style {
            MapStyle::Standard => Color::from_rgba8(224, 219, 205, 255),
            MapStyle::Satellite => Color::from_rgba8(42, 58, 38, 255),
            MapStyle::Hybrid => Color::from_rgba8(52, 64, 48, 255),
        }
    }
}

impl TileRenderer for PlaceholderTileRenderer {
    fn render_tile(
        &self,
        _coord: Coordinate,
        _extent_m: u32,
        style: MapStyle,
        pixel_width: u32,
    ) -> Result<Pixmap, TileError> {
        let mut pixmap = Pixmap::new(pixel_width, pixel_width).ok_or_else(|| {
            TileError::Unavailable(format!("invalid tile size {pixel_width}"))
        })?;
        pixmap.fill(Self::fill_color(style));
        Ok(pixmap)
    }
}
