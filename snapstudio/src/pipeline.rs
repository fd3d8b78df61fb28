//! Two-phase render pipeline.
//!
//! `render_preview` runs the synchronous fast path (snapshot, rotation,
//! composite without an address) and returns immediately. Exactly one
//! background worker per request then resolves the address and, when it
//! still corresponds to the current request, recomposites the same cached
//! rotated image with the chip and delivers it as an [`UpgradeEvent`] over
//! the channel handed out at construction.
//!
//! Staleness is message passing, not callback mutation: the pipeline owns a
//! current-request cell, every worker carries its request id, and a result
//! whose id no longer matches the cell is discarded undelivered. The fast
//! preview therefore always precedes its upgrade, and an old address can
//! never land on a newer coordinate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tiny_skia::Pixmap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cache::MeasurementCache;
use crate::compose::OverlayCompositor;
use crate::error::RenderError;
use crate::geocode::{AddressResolver, FallbackGeocoder, PrimaryGeocoder};
use crate::params::{OverlayFlags, RenderParams};
use crate::snapshot::{SnapshotService, TileRenderer};
use crate::telemetry::{PipelineMetrics, TelemetrySnapshot};
use crate::text::TextEngine;

/// Tuning knobs for a pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Entry bound of the text measurement cache.
    pub measurement_cache_capacity: u64,
    /// Entry bound of the address cache.
    pub address_cache_capacity: u64,
    /// Cache "no address" outcomes to spare dead coordinates from repeated
    /// provider traffic. Off by default: a later request retries.
    pub cache_negative_lookups: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            measurement_cache_capacity: 4096,
            address_cache_capacity: 1024,
            cache_negative_lookups: false,
        }
    }
}

impl PipelineConfig {
    /// Set the measurement cache capacity.
    pub fn with_measurement_capacity(mut self, capacity: u64) -> Self {
        self.measurement_cache_capacity = capacity;
        self
    }

    /// Set the address cache capacity.
    pub fn with_address_capacity(mut self, capacity: u64) -> Self {
        self.address_cache_capacity = capacity;
        self
    }

    /// Enable or disable negative-lookup caching.
    pub fn with_negative_caching(mut self, enabled: bool) -> Self {
        self.cache_negative_lookups = enabled;
        self
    }
}

/// Identity of one render request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The synchronous result of a render request.
#[derive(Debug, Clone)]
pub struct Preview {
    /// Identity to correlate with a later [`UpgradeEvent`].
    pub request: RequestId,
    /// The composited image, without an address chip.
    pub image: Arc<Pixmap>,
}

/// Asynchronous follow-up to a preview. Zero or one event per request.
#[derive(Debug, Clone)]
pub enum UpgradeEvent {
    /// The address resolved; the image is the preview plus the chip.
    Upgraded {
        /// The request this upgrade belongs to.
        request: RequestId,
        /// The upgraded image.
        image: Arc<Pixmap>,
    },
    /// Resolution finished empty or failed; the preview stays valid.
    Unavailable {
        /// The request that resolved empty.
        request: RequestId,
    },
}

impl UpgradeEvent {
    /// The request this event belongs to.
    pub fn request(&self) -> RequestId {
        match self {
            UpgradeEvent::Upgraded { request, .. } => *request,
            UpgradeEvent::Unavailable { request } => *request,
        }
    }
}

/// Coordinates snapshot caching, compositing, and address resolution into
/// the fast-preview / async-upgrade protocol.
pub struct RenderPipeline {
    snapshots: SnapshotService,
    compositor: Arc<OverlayCompositor>,
    resolver: Arc<AddressResolver>,
    metrics: Arc<PipelineMetrics>,
    current: Arc<Mutex<Option<RequestId>>>,
    next_id: AtomicU64,
    upgrades: mpsc::UnboundedSender<UpgradeEvent>,
}

impl RenderPipeline {
    /// Wire a pipeline from its collaborators.
    ///
    /// Returns the pipeline and the receiver on which upgrade events for
    /// every request arrive.
    pub fn new(
        config: PipelineConfig,
        tiles: Arc<dyn TileRenderer>,
        text: Arc<dyn TextEngine>,
        primary: Option<Arc<dyn PrimaryGeocoder>>,
        fallback: Option<Arc<dyn FallbackGeocoder>>,
    ) -> (Self, mpsc::UnboundedReceiver<UpgradeEvent>) {
        let metrics = Arc::new(PipelineMetrics::new());
        let measure = Arc::new(MeasurementCache::new(
            text.clone(),
            config.measurement_cache_capacity,
            metrics.clone(),
        ));
        let compositor = Arc::new(OverlayCompositor::new(text, measure));
        let resolver = Arc::new(AddressResolver::new(
            primary,
            fallback,
            config.address_cache_capacity,
            config.cache_negative_lookups,
            metrics.clone(),
        ));
        let (sender, receiver) = mpsc::unbounded_channel();
        let pipeline = Self {
            snapshots: SnapshotService::new(tiles, metrics.clone()),
            compositor,
            resolver,
            metrics,
            current: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(0),
            upgrades: sender,
        };
        (pipeline, receiver)
    }

    /// Render the fast preview and start background address resolution.
    ///
    /// Returns synchronously; the upgraded image, if the address resolves,
    /// arrives later on the channel. A tile failure aborts the request and
    /// starts no background work.
    ///
    /// # Errors
    ///
    /// Returns `RenderError` when base imagery cannot be acquired or the
    /// base image is unusable.
    pub fn render_preview(
        &self,
        params: RenderParams,
        flags: OverlayFlags,
    ) -> Result<Preview, RenderError> {
        let request = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);

        let snapshot = self.snapshots.snapshot(&params).inspect_err(|_| {
            self.metrics.render_failed();
        })?;
        let rotated = self.snapshots.rotated(&snapshot, params.rotation_deg);
        let image = self
            .compositor
            .compose(&rotated, &params, &flags, None)
            .inspect_err(|_| self.metrics.render_failed())?;

        *self.current.lock() = Some(request);
        self.metrics.preview_rendered();
        info!(
            %request,
            lat = params.coordinate.lat,
            lon = params.coordinate.lon,
            extent_m = params.extent_m,
            style = %params.style,
            "Preview rendered; resolving address in background"
        );

        self.spawn_resolution(request, params, flags, rotated);
        Ok(Preview {
            request,
            image: Arc::new(image),
        })
    }

    /// Point-in-time pipeline counters.
    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.metrics.snapshot()
    }

    /// Both geocoders are blocking calls, so each request gets a dedicated
    /// worker thread; the foreground path never waits on it.
    fn spawn_resolution(
        &self,
        request: RequestId,
        params: RenderParams,
        flags: OverlayFlags,
        rotated: Arc<Pixmap>,
    ) {
        let resolver = self.resolver.clone();
        let compositor = self.compositor.clone();
        let current = self.current.clone();
        let metrics = self.metrics.clone();
        let sender = self.upgrades.clone();

        std::thread::spawn(move || {
            let address = resolver.resolve(params.coordinate);

            if *current.lock() != Some(request) {
                metrics.upgrade_discarded();
                debug!(%request, "Discarding stale address resolution");
                return;
            }

            let Some(text) = address else {
                metrics.upgrade_unavailable();
                debug!(%request, "Address lookup unavailable");
                let _ = sender.send(UpgradeEvent::Unavailable { request });
                return;
            };

            match compositor.compose(&rotated, &params, &flags, Some(&text)) {
                Ok(image) => {
                    // Re-check: a newer preview may have landed while the
                    // chip was being drawn.
                    if *current.lock() != Some(request) {
                        metrics.upgrade_discarded();
                        debug!(%request, "Discarding stale upgraded image");
                        return;
                    }
                    metrics.upgrade_delivered();
                    info!(%request, "Address upgrade delivered");
                    let _ = sender.send(UpgradeEvent::Upgraded {
                        request,
                        image: Arc::new(image),
                    });
                }
                Err(e) => {
                    warn!(%request, error = %e, "Upgrade compositing failed");
                    metrics.upgrade_unavailable();
                    let _ = sender.send(UpgradeEvent::Unavailable { request });
                }
            }
        });
    }
}
