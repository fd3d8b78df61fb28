//! Base-tile acquisition and rotation with single-slot memoization.
//!
//! `SnapshotService` sits in front of a [`TileRenderer`] collaborator. The
//! snapshot slot keys on (rounded coordinate, extent, style, pixel width);
//! the rotation slot keys on the snapshot's identity and the angle, and is
//! invalidated whenever a new snapshot replaces the slot. Only the latest
//! request is worth remembering: repeated renders with unchanged controls
//! are the common case this serves.

mod rotate;

pub use rotate::{rotated_canvas_side, ROTATION_EPSILON_DEG};

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tiny_skia::Pixmap;
use tracing::{debug, warn};

use crate::cache::SingleSlot;
use crate::coord::Coordinate;
use crate::params::{MapStyle, RenderParams, SnapshotKey};
use crate::telemetry::PipelineMetrics;

/// Errors from the tile-render collaborator.
#[derive(Debug, Error)]
pub enum TileError {
    /// No imagery could be produced for the request.
    #[error("Tile imagery unavailable: {0}")]
    Unavailable(String),
}

/// Renders a square base tile for a coordinate and extent.
///
/// Implementations must be thread-safe; the pipeline calls from its
/// foreground path while background workers hold clones of earlier results.
pub trait TileRenderer: Send + Sync {
    /// Render the base tile.
    ///
    /// # Errors
    ///
    /// Returns `TileError::Unavailable` when no imagery can be produced;
    /// the failure is fatal to the enclosing render request.
    fn render_tile(
        &self,
        coord: Coordinate,
        extent_m: u32,
        style: MapStyle,
        pixel_width: u32,
    ) -> Result<Pixmap, TileError>;
}

/// Identity of a cached rotation: source snapshot pointer plus angle.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RotationKey {
    src: usize,
    degrees: f32,
}

/// Caching layer over tile rendering and rotation.
pub struct SnapshotService {
    renderer: Arc<dyn TileRenderer>,
    snapshot: Mutex<SingleSlot<SnapshotKey, Arc<Pixmap>>>,
    rotation: Mutex<SingleSlot<RotationKey, Arc<Pixmap>>>,
    metrics: Arc<PipelineMetrics>,
}

impl SnapshotService {
    /// Create a service delegating to `renderer`.
    pub fn new(renderer: Arc<dyn TileRenderer>, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            renderer,
            snapshot: Mutex::new(SingleSlot::new()),
            rotation: Mutex::new(SingleSlot::new()),
            metrics,
        }
    }

    /// Fetch the base tile for `params`, reusing the slot on a key match.
    ///
    /// A renderer failure propagates without touching either slot, so a
    /// still-valid entry for the previous key survives.
    ///
    /// # Errors
    ///
    /// Returns `TileError` from the collaborator.
    pub fn snapshot(&self, params: &RenderParams) -> Result<Arc<Pixmap>, TileError> {
        let key = params.snapshot_key();
        let mut slot = self.snapshot.lock();
        if let Some(image) = slot.get(&key) {
            self.metrics.snapshot_hit();
            debug!(?key, "Snapshot served from slot");
            return Ok(image);
        }

        self.metrics.tile_rendered();
        let image = Arc::new(self.renderer.render_tile(
            params.coordinate,
            params.extent_m,
            params.style,
            params.pixel_width,
        )?);
        slot.store(key, image.clone());
        // The rotation slot derives from the replaced snapshot and is now
        // stale regardless of angle.
        self.rotation.lock().invalidate();
        debug!(?key, "Snapshot rendered and cached");
        Ok(image)
    }

    /// Rotate `src` by `degrees`, reusing the slot when both the source
    /// identity and angle match.
    ///
    /// Angles within [`ROTATION_EPSILON_DEG`] of zero return the input
    /// unchanged, with no copy materialized.
    pub fn rotated(&self, src: &Arc<Pixmap>, degrees: f32) -> Arc<Pixmap> {
        if degrees.abs() < ROTATION_EPSILON_DEG {
            return src.clone();
        }
        let key = RotationKey {
            src: Arc::as_ptr(src) as usize,
            degrees,
        };
        let mut slot = self.rotation.lock();
        if let Some(image) = slot.get(&key) {
            self.metrics.rotation_hit();
            return image;
        }

        self.metrics.rotation_computed();
        let Some(rotated) = rotate::rotate_about_center(src, degrees) else {
            warn!(degrees, "Rotation produced no canvas; reusing source");
            return src.clone();
        };
        let rotated = Arc::new(rotated);
        slot.store(key, rotated.clone());
        debug!(degrees, side = rotated.width(), "Rotation computed and cached");
        rotated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{MapStyle, RenderParams};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tiny_skia::Color;

    /// Renderer that counts calls and optionally fails for a style.
    struct MockRenderer {
        calls: AtomicUsize,
        fail_style: Option<MapStyle>,
    }

    impl MockRenderer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_style: None,
            }
        }

        fn failing_on(style: MapStyle) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_style: Some(style),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    impl TileRenderer for MockRenderer {
        fn render_tile(
            &self,
            _coord: Coordinate,
            _extent_m: u32,
            style: MapStyle,
            pixel_width: u32,
        ) -> Result<Pixmap, TileError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.fail_style == Some(style) {
                return Err(TileError::Unavailable("mock outage".to_string()));
            }
            let mut pixmap = Pixmap::new(pixel_width, pixel_width)
                .ok_or_else(|| TileError::Unavailable("zero size".to_string()))?;
            pixmap.fill(Color::from_rgba8(10, 20, 30, 255));
            Ok(pixmap)
        }
    }

    fn params(rotation: f32) -> RenderParams {
        RenderParams::new(
            Coordinate::new(40.0, -73.0).unwrap(),
            800,
            MapStyle::Hybrid,
            rotation,
            64,
        )
    }

    fn service(renderer: Arc<MockRenderer>) -> SnapshotService {
        SnapshotService::new(renderer, Arc::new(PipelineMetrics::new()))
    }

    #[test]
    fn test_unchanged_params_render_once() {
        let renderer = Arc::new(MockRenderer::new());
        let service = service(renderer.clone());

        let first = service.snapshot(&params(0.0)).unwrap();
        let second = service.snapshot(&params(0.0)).unwrap();

        assert_eq!(renderer.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_rotation_change_does_not_refetch() {
        let renderer = Arc::new(MockRenderer::new());
        let service = service(renderer.clone());

        let snap = service.snapshot(&params(0.0)).unwrap();
        let _ = service.rotated(&snap, 30.0);
        let snap2 = service.snapshot(&params(30.0)).unwrap();

        assert_eq!(renderer.calls(), 1);
        assert!(Arc::ptr_eq(&snap, &snap2));
    }

    #[test]
    fn test_extent_change_refetches() {
        let renderer = Arc::new(MockRenderer::new());
        let service = service(renderer.clone());

        service.snapshot(&params(0.0)).unwrap();
        let mut bigger = params(0.0);
        bigger.extent_m = 1200;
        service.snapshot(&bigger).unwrap();

        assert_eq!(renderer.calls(), 2);
    }

    #[test]
    fn test_zero_rotation_returns_same_arc() {
        let renderer = Arc::new(MockRenderer::new());
        let service = service(renderer);

        let snap = service.snapshot(&params(0.0)).unwrap();
        let rotated = service.rotated(&snap, 0.0);
        assert!(Arc::ptr_eq(&snap, &rotated));

        let nearly = service.rotated(&snap, 0.005);
        assert!(Arc::ptr_eq(&snap, &nearly));
    }

    #[test]
    fn test_rotation_cached_per_angle() {
        let renderer = Arc::new(MockRenderer::new());
        let metrics = Arc::new(PipelineMetrics::new());
        let service = SnapshotService::new(renderer, metrics.clone());

        let snap = service.snapshot(&params(0.0)).unwrap();
        let a = service.rotated(&snap, 45.0);
        let b = service.rotated(&snap, 45.0);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(metrics.snapshot().rotations, 1);
        assert_eq!(metrics.snapshot().rotation_hits, 1);

        let _ = service.rotated(&snap, 90.0);
        assert_eq!(metrics.snapshot().rotations, 2);
    }

    #[test]
    fn test_new_snapshot_invalidates_rotation() {
        let renderer = Arc::new(MockRenderer::new());
        let metrics = Arc::new(PipelineMetrics::new());
        let service = SnapshotService::new(renderer, metrics.clone());

        let snap = service.snapshot(&params(0.0)).unwrap();
        let _ = service.rotated(&snap, 45.0);

        let mut other = params(0.0);
        other.extent_m = 1200;
        let snap2 = service.snapshot(&other).unwrap();
        let _ = service.rotated(&snap2, 45.0);

        assert_eq!(metrics.snapshot().rotations, 2);
        assert_eq!(metrics.snapshot().rotation_hits, 0);
    }

    #[test]
    fn test_failure_preserves_cached_entry() {
        let renderer = Arc::new(MockRenderer::failing_on(MapStyle::Standard));
        let service = service(renderer.clone());

        service.snapshot(&params(0.0)).unwrap();

        let mut failing = params(0.0);
        failing.style = MapStyle::Standard;
        assert!(service.snapshot(&failing).is_err());

        // The hybrid entry is still served without a new fetch.
        service.snapshot(&params(0.0)).unwrap();
        assert_eq!(renderer.calls(), 2);
    }

    #[test]
    fn test_rotated_canvas_contains_content() {
        let renderer = Arc::new(MockRenderer::new());
        let service = service(renderer);
        let snap = service.snapshot(&params(0.0)).unwrap();

        let rotated = service.rotated(&snap, 45.0);
        assert_eq!(rotated.width(), rotated_canvas_side(64, 45.0));
    }
}
