//! Render request parameters and overlay toggles.
//!
//! A `RenderParams` is an immutable value describing one snapshot request.
//! Constructors snap extent and rotation onto their supported steps so that
//! near-identical requests produce identical cache keys.

use std::fmt;
use std::str::FromStr;

use crate::coord::{Coordinate, RoundedCoord};

/// Minimum ground coverage in meters.
pub const MIN_EXTENT_M: u32 = 150;
/// Maximum ground coverage in meters.
pub const MAX_EXTENT_M: u32 = 6000;
/// Coverage snaps to this step in meters.
pub const EXTENT_STEP_M: u32 = 50;
/// Rotation snaps to this step in degrees.
pub const ROTATION_STEP_DEG: f32 = 1.0;

/// Base map imagery style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MapStyle {
    /// Street map tiles.
    Standard,
    /// Aerial imagery.
    #[default]
    Satellite,
    /// Aerial imagery with road/label overlay.
    Hybrid,
}

impl MapStyle {
    /// Lowercase style name, as used in cache keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            MapStyle::Standard => "standard",
            MapStyle::Satellite => "satellite",
            MapStyle::Hybrid => "hybrid",
        }
    }

    /// Capitalized style name for the caption line.
    pub fn label(&self) -> &'static str {
        match self {
            MapStyle::Standard => "Standard",
            MapStyle::Satellite => "Satellite",
            MapStyle::Hybrid => "Hybrid",
        }
    }
}

impl fmt::Display for MapStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MapStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(MapStyle::Standard),
            "satellite" => Ok(MapStyle::Satellite),
            "hybrid" => Ok(MapStyle::Hybrid),
            other => Err(format!("unknown map style: {other}")),
        }
    }
}

/// Which overlays the compositor draws.
///
/// The address chip is controlled by the presence of an address label, not by
/// a flag; the scale bar and orientation marker are always drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayFlags {
    /// Draw translucent grid lines.
    pub grid: bool,
    /// Number of grid divisions per axis, clamped to 2..=5 when drawn.
    pub grid_divisions: u8,
    /// Draw the center crosshair.
    pub crosshair: bool,
    /// Draw the bottom-right caption box.
    pub caption: bool,
}

impl Default for OverlayFlags {
    fn default() -> Self {
        Self {
            grid: true,
            grid_divisions: 4,
            crosshair: true,
            caption: true,
        }
    }
}

/// Immutable parameters for one snapshot render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    /// Center of the snapshot.
    pub coordinate: Coordinate,
    /// Ground coverage in meters (both axes; snapshots are square).
    pub extent_m: u32,
    /// Base imagery style.
    pub style: MapStyle,
    /// Clockwise rotation in degrees, 0..=360.
    pub rotation_deg: f32,
    /// Output edge length in pixels.
    pub pixel_width: u32,
}

impl RenderParams {
    /// Build params, snapping extent and rotation onto their steps.
    pub fn new(
        coordinate: Coordinate,
        extent_m: u32,
        style: MapStyle,
        rotation_deg: f32,
        pixel_width: u32,
    ) -> Self {
        Self {
            coordinate,
            extent_m: snap_extent(extent_m),
            style,
            rotation_deg: snap_rotation(rotation_deg),
            pixel_width,
        }
    }

    /// The identity of the base tile this request needs.
    pub fn snapshot_key(&self) -> SnapshotKey {
        SnapshotKey {
            coord: self.coordinate.rounded(),
            extent_m: self.extent_m,
            style: self.style,
            pixel_width: self.pixel_width,
        }
    }

    /// Human-readable extent, "800 m" below a kilometer, "1.5 km" above.
    pub fn extent_label(&self) -> String {
        meters_label(self.extent_m)
    }
}

/// Cache identity of a base tile: rounded center, extent, style, and size.
///
/// Rotation is deliberately absent; rotating a cached tile must not trigger
/// a new fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    /// Rounded snapshot center.
    pub coord: RoundedCoord,
    /// Ground coverage in meters.
    pub extent_m: u32,
    /// Imagery style.
    pub style: MapStyle,
    /// Output edge length in pixels.
    pub pixel_width: u32,
}

/// Clamp coverage into range and snap it to the 50 m step.
pub fn snap_extent(extent_m: u32) -> u32 {
    let clamped = extent_m.clamp(MIN_EXTENT_M, MAX_EXTENT_M);
    let snapped = ((clamped + EXTENT_STEP_M / 2) / EXTENT_STEP_M) * EXTENT_STEP_M;
    snapped.clamp(MIN_EXTENT_M, MAX_EXTENT_M)
}

/// Clamp rotation into 0..=360 and snap it to whole degrees.
pub fn snap_rotation(deg: f32) -> f32 {
    let snapped = (deg / ROTATION_STEP_DEG).round() * ROTATION_STEP_DEG;
    snapped.clamp(0.0, 360.0)
}

/// Format a ground distance: meters below 1 km, one-decimal kilometers above.
pub fn meters_label(meters: u32) -> String {
    if meters < 1000 {
        format!("{meters} m")
    } else {
        format!("{:.1} km", meters as f64 / 1000.0)
    }
}
