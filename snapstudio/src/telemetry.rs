//! Pipeline telemetry for observability and tests.
//!
//! Lock-free atomic counters recorded by the caches, the resolver, and the
//! render pipeline, with a point-in-time `snapshot()` for display. The
//! counters also back the cache-behavior assertions in the test suite.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one pipeline instance.
///
/// All updates use relaxed ordering; the counters are statistics, not
/// synchronization.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    previews_rendered: AtomicU64,
    render_failures: AtomicU64,
    tile_renders: AtomicU64,
    snapshot_hits: AtomicU64,
    rotations: AtomicU64,
    rotation_hits: AtomicU64,
    measure_hits: AtomicU64,
    measure_misses: AtomicU64,
    address_cache_hits: AtomicU64,
    primary_lookups: AtomicU64,
    fallback_lookups: AtomicU64,
    upgrades_delivered: AtomicU64,
    upgrades_unavailable: AtomicU64,
    upgrades_discarded: AtomicU64,
}

impl PipelineMetrics {
    /// Create a zeroed metrics block.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fast preview was composed and returned.
    pub fn preview_rendered(&self) {
        self.previews_rendered.fetch_add(1, Ordering::Relaxed);
    }

    /// A render request failed before producing a preview.
    pub fn render_failed(&self) {
        self.render_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// The tile-render collaborator was invoked.
    pub fn tile_rendered(&self) {
        self.tile_renders.fetch_add(1, Ordering::Relaxed);
    }

    /// The snapshot slot served a request without a fetch.
    pub fn snapshot_hit(&self) {
        self.snapshot_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// A rotation was computed.
    pub fn rotation_computed(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    /// The rotation slot served a request without recomputing.
    pub fn rotation_hit(&self) {
        self.rotation_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Text measurement served from cache.
    pub fn measure_hit(&self) {
        self.measure_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Text measurement delegated to the engine.
    pub fn measure_miss(&self) {
        self.measure_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Address served from cache without any provider call.
    pub fn address_cache_hit(&self) {
        self.address_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// The primary geocoder was called.
    pub fn primary_lookup(&self) {
        self.primary_lookups.fetch_add(1, Ordering::Relaxed);
    }

    /// The fallback geocoder was called.
    pub fn fallback_lookup(&self) {
        self.fallback_lookups.fetch_add(1, Ordering::Relaxed);
    }

    /// An address-upgraded image was delivered.
    pub fn upgrade_delivered(&self) {
        self.upgrades_delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Resolution finished empty; only a status was delivered.
    pub fn upgrade_unavailable(&self) {
        self.upgrades_unavailable.fetch_add(1, Ordering::Relaxed);
    }

    /// A stale resolution result was discarded undelivered.
    pub fn upgrade_discarded(&self) {
        self.upgrades_discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            previews_rendered: self.previews_rendered.load(Ordering::Relaxed),
            render_failures: self.render_failures.load(Ordering::Relaxed),
            tile_renders: self.tile_renders.load(Ordering::Relaxed),
            snapshot_hits: self.snapshot_hits.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            rotation_hits: self.rotation_hits.load(Ordering::Relaxed),
            measure_hits: self.measure_hits.load(Ordering::Relaxed),
            measure_misses: self.measure_misses.load(Ordering::Relaxed),
            address_cache_hits: self.address_cache_hits.load(Ordering::Relaxed),
            primary_lookups: self.primary_lookups.load(Ordering::Relaxed),
            fallback_lookups: self.fallback_lookups.load(Ordering::Relaxed),
            upgrades_delivered: self.upgrades_delivered.load(Ordering::Relaxed),
            upgrades_unavailable: self.upgrades_unavailable.load(Ordering::Relaxed),
            upgrades_discarded: self.upgrades_discarded.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`PipelineMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    /// Fast previews composed and returned.
    pub previews_rendered: u64,
    /// Requests failed before producing a preview.
    pub render_failures: u64,
    /// Calls into the tile-render collaborator.
    pub tile_renders: u64,
    /// Snapshot slot hits.
    pub snapshot_hits: u64,
    /// Rotations computed.
    pub rotations: u64,
    /// Rotation slot hits.
    pub rotation_hits: u64,
    /// Measurement cache hits.
    pub measure_hits: u64,
    /// Measurement cache misses.
    pub measure_misses: u64,
    /// Address cache hits.
    pub address_cache_hits: u64,
    /// Primary geocoder calls.
    pub primary_lookups: u64,
    /// Fallback geocoder calls.
    pub fallback_lookups: u64,
    /// Upgraded images delivered.
    pub upgrades_delivered: u64,
    /// Empty resolutions (status-only deliveries).
    pub upgrades_unavailable: u64,
    /// Stale resolutions discarded.
    pub upgrades_discarded: u64,
}
