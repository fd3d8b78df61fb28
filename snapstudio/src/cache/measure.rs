//! Memoized text-extent lookups.

use std::sync::Arc;

use moka::sync::Cache;

use crate::telemetry::PipelineMetrics;
use crate::text::{FontSpec, TextEngine, TextSize};

/// Cache key: family, size (in hundredths to stay hashable), text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MeasureKey {
    family: String,
    size_centi: u32,
    text: String,
}

impl MeasureKey {
    fn new(text: &str, font: &FontSpec) -> Self {
        Self {
            family: font.family.clone(),
            size_centi: (font.size * 100.0).round() as u32,
            text: text.to_string(),
        }
    }
}

/// Bounded memoization in front of a [`TextEngine`]'s `measure`.
///
/// Layout code measures the same short strings over and over (chip lines,
/// captions, scale labels); a hit skips shaping entirely. Entries are
/// write-once-per-key and idempotent, so concurrent misses for the same key
/// are harmless. Capacity is an explicit parameter, evicted LRU.
pub struct MeasurementCache {
    cache: Cache<MeasureKey, TextSize>,
    engine: Arc<dyn TextEngine>,
    metrics: Arc<PipelineMetrics>,
}

impl MeasurementCache {
    /// Create a cache delegating to `engine`, holding up to `capacity` keys.
    pub fn new(engine: Arc<dyn TextEngine>, capacity: u64, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            cache: Cache::new(capacity),
            engine,
            metrics,
        }
    }

    /// Measure `text`, consulting the cache first.
    pub fn measure(&self, text: &str, font: &FontSpec) -> TextSize {
        let key = MeasureKey::new(text, font);
        if let Some(size) = self.cache.get(&key) {
            self.metrics.measure_hit();
            return size;
        }
        self.metrics.measure_miss();
        let size = self.engine.measure(text, font);
        self.cache.insert(key, size);
        size
    }

    /// Current number of cached measurements.
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}
