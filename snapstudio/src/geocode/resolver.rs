//! Two-tier address resolution with a bounded coordinate-keyed cache.

use std::sync::Arc;

use moka::sync::Cache;
use tracing::{debug, warn};

use super::{format_osm, format_placemark, FallbackGeocoder, PrimaryGeocoder};
use crate::coord::{Coordinate, RoundedCoord};
use crate::telemetry::PipelineMetrics;

/// Cached outcome of a lookup. Negative outcomes are stored only when
/// negative caching is enabled.
#[derive(Debug, Clone)]
enum CachedLookup {
    Found(Arc<str>),
    NotFound,
}

/// Resolves coordinates to compact address labels.
///
/// Lookups walk primary then fallback providers; the first non-empty
/// formatted result wins and is cached under the 5-decimal rounded
/// coordinate. Provider errors are logged and absorbed. Whether an empty
/// outcome is cached (to spare a dead coordinate from repeated fallback
/// traffic) is an explicit choice; by default it is not, and every request
/// retries.
pub struct AddressResolver {
    primary: Option<Arc<dyn PrimaryGeocoder>>,
    fallback: Option<Arc<dyn FallbackGeocoder>>,
    cache: Cache<RoundedCoord, CachedLookup>,
    cache_negatives: bool,
    metrics: Arc<PipelineMetrics>,
}

impl AddressResolver {
    /// Create a resolver over the given providers.
    ///
    /// `capacity` bounds the address cache (entries, evicted LRU);
    /// `cache_negatives` controls whether "no address" outcomes are stored.
    pub fn new(
        primary: Option<Arc<dyn PrimaryGeocoder>>,
        fallback: Option<Arc<dyn FallbackGeocoder>>,
        capacity: u64,
        cache_negatives: bool,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            primary,
            fallback,
            cache: Cache::new(capacity),
            cache_negatives,
            metrics,
        }
    }

    /// Resolve a compact address label for `coord`.
    ///
    /// Returns `None` when no provider yields a formattable address, a
    /// legitimate terminal outcome, never an error.
    pub fn resolve(&self, coord: Coordinate) -> Option<Arc<str>> {
        let key = coord.rounded();
        if let Some(hit) = self.cache.get(&key) {
            self.metrics.address_cache_hit();
            debug!(?key, "Address served from cache");
            return match hit {
                CachedLookup::Found(text) => Some(text),
                CachedLookup::NotFound => None,
            };
        }

        if let Some(text) = self.lookup(coord) {
            self.cache.insert(key, CachedLookup::Found(text.clone()));
            return Some(text);
        }
        if self.cache_negatives {
            self.cache.insert(key, CachedLookup::NotFound);
        }
        debug!(?key, "No address resolved");
        None
    }

    fn lookup(&self, coord: Coordinate) -> Option<Arc<str>> {
        if let Some(primary) = &self.primary {
            self.metrics.primary_lookup();
            match primary.reverse_geocode(coord) {
                Ok(Some(placemark)) => {
                    if let Some(addr) = format_placemark(&placemark) {
                        return Some(addr.text().into());
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Primary geocoder failed; trying fallback"),
            }
        }
        if let Some(fallback) = &self.fallback {
            self.metrics.fallback_lookup();
            match fallback.reverse_geocode(coord) {
                Ok(Some(address)) => {
                    if let Some(addr) = format_osm(&address) {
                        return Some(addr.text().into());
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Fallback geocoder failed"),
            }
        }
        None
    }
}
