//! Reverse geocoding: providers, compact formatting, and the address cache.
//!
//! Resolution is two-tier: a primary (device-style) provider first, then a
//! networked fallback. Both feed the same compact two-line format, which
//! suppresses county names whenever a real city-level field exists. Provider
//! errors are absorbed; an unresolved address is a legitimate outcome, not
//! a fault.

mod nominatim;
mod placemark;
mod resolver;

pub use nominatim::{
    format_osm, NominatimGeocoder, OsmAddress, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER_AGENT,
};
pub use placemark::{format_placemark, CompactAddress, Placemark};
pub use resolver::AddressResolver;

use thiserror::Error;

use crate::coord::Coordinate;

/// Errors from geocode providers. Always recoverable: the resolver falls
/// back or reports "no address".
#[derive(Debug, Clone, Error)]
pub enum GeocodeError {
    /// Transport-level failure or non-success status.
    #[error("Geocoder HTTP error: {0}")]
    Http(String),

    /// Response body could not be parsed.
    #[error("Geocoder response parse error: {0}")]
    Parse(String),
}

/// Device-style reverse geocoder returning a structured placemark.
pub trait PrimaryGeocoder: Send + Sync {
    /// Look up the placemark for a coordinate, `None` when the provider has
    /// no answer.
    ///
    /// # Errors
    ///
    /// Returns `GeocodeError` on provider failure; the resolver treats this
    /// as a miss and proceeds to the fallback.
    fn reverse_geocode(&self, coord: Coordinate) -> Result<Option<Placemark>, GeocodeError>;
}

/// Networked reverse geocoder returning the raw provider address object.
pub trait FallbackGeocoder: Send + Sync {
    /// Look up the address object for a coordinate.
    ///
    /// # Errors
    ///
    /// Returns `GeocodeError` on provider failure; the resolver treats this
    /// as "no address".
    fn reverse_geocode(&self, coord: Coordinate) -> Result<Option<OsmAddress>, GeocodeError>;
}
