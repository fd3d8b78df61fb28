//! Tile rendering via staticmap tile stitching.

use staticmap::StaticMapBuilder;
use tiny_skia::Pixmap;
use tracing::debug;

use crate::coord::Coordinate;
use crate::params::MapStyle;
use crate::snapshot::{TileError, TileRenderer};

/// Equatorial ground resolution of Web Mercator zoom 0, meters per pixel at
/// 256 px tiles.
const ZOOM0_RESOLUTION_M: f64 = 156_543.033_92;
/// Zoom levels supported by the imagery endpoints.
const MIN_ZOOM: u8 = 1;
const MAX_ZOOM: u8 = 19;

/// Renders base tiles by stitching slippy-map tiles around the center.
///
/// Each [`MapStyle`] maps to a tile server URL template; the zoom level is
/// fitted so the stitched image covers roughly the requested ground extent
/// at the requested pixel size.
pub struct StaticmapTileRenderer;

impl StaticmapTileRenderer {
    /// Create a renderer using the built-in style endpoints.
    pub fn new() -> Self {
        Self
    }

    fn url_template(style: MapStyle) -> &'static str {
        match style {
            MapStyle::Standard => "https://a.tile.osm.org/{z}/{x}/{y}.png",
            MapStyle::Satellite => {
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}"
            }
            MapStyle::Hybrid => "https://mt1.google.com/vt/lyrs=y&x={x}&y={y}&z={z}",
        }
    }
}

impl Default for StaticmapTileRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TileRenderer for StaticmapTileRenderer {
    fn render_tile(
        &self,
        coord: Coordinate,
        extent_m: u32,
        style: MapStyle,
        pixel_width: u32,
    ) -> Result<Pixmap, TileError> {
        let zoom = zoom_for_extent(coord.lat, extent_m, pixel_width);
        debug!(
            lat = coord.lat,
            lon = coord.lon,
            extent_m,
            %style,
            zoom,
            "Rendering base tile"
        );

        let mut map = StaticMapBuilder::default()
            .width(pixel_width)
            .height(pixel_width)
            .url_template(Self::url_template(style))
            .zoom(zoom)
            .lat_center(coord.lat)
            .lon_center(coord.lon)
            .build()
            .map_err(|e| TileError::Unavailable(format!("Failed to build map: {e}")))?;

        let png = map
            .encode_png()
            .map_err(|e| TileError::Unavailable(format!("Tile fetch failed: {e}")))?;
        Pixmap::decode_png(&png)
            .map_err(|e| TileError::Unavailable(format!("Tile decode failed: {e}")))
    }
}

/// Web Mercator zoom whose ground resolution at `lat` best matches
/// `extent_m / pixel_width`.
pub fn zoom_for_extent(lat: f64, extent_m: u32, pixel_width: u32) -> u8 {
    if extent_m == 0 || pixel_width == 0 {
        return MAX_ZOOM;
    }
    let target_mpp = extent_m as f64 / pixel_width as f64;
    let lat_resolution = ZOOM0_RESOLUTION_M * lat.to_radians().cos().abs().max(1e-6);
    let zoom = (lat_resolution / target_mpp).log2().round();
    zoom.clamp(MIN_ZOOM as f64, MAX_ZOOM as f64) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_increases_with_detail() {
        // Tighter extent at the same pixel size needs a deeper zoom.
        let wide = zoom_for_extent(40.0, 6000, 512);
        let tight = zoom_for_extent(40.0, 150, 512);
        assert!(tight > wide);
    }

    #[test]
    fn test_zoom_reasonable_for_city_block() {
        // 800 m across 512 px near 40°N lands in the street-level range.
        let zoom = zoom_for_extent(40.0, 800, 512);
        assert!((15..=18).contains(&zoom), "got zoom {zoom}");
    }

    #[test]
    fn test_zoom_clamped_at_poles_and_extremes() {
        assert!(zoom_for_extent(89.9, 150, 4096) <= MAX_ZOOM);
        assert!(zoom_for_extent(0.0, 6000, 1) >= MIN_ZOOM);
    }

    #[test]
    fn test_each_style_has_template() {
        for style in [MapStyle::Standard, MapStyle::Satellite, MapStyle::Hybrid] {
            let template = StaticmapTileRenderer::url_template(style);
            assert!(template.contains("{z}") || template.contains("z="));
        }
    }
}
