//! Geographic coordinate types and cache-key rounding.
//!
//! Snapshot and address caches key on coordinates rounded to five decimal
//! places (~1.1 m on the ground), which absorbs GPS jitter between otherwise
//! identical requests.

use thiserror::Error;

/// Minimum supported latitude in degrees.
pub const MIN_LAT: f64 = -90.0;
/// Maximum supported latitude in degrees.
pub const MAX_LAT: f64 = 90.0;
/// Minimum supported longitude in degrees.
pub const MIN_LON: f64 = -180.0;
/// Maximum supported longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Errors for invalid geographic input.
#[derive(Debug, Error, PartialEq)]
pub enum CoordError {
    /// Latitude outside the supported range.
    #[error("Invalid latitude: {0} (must be {MIN_LAT} to {MAX_LAT})")]
    InvalidLatitude(f64),

    /// Longitude outside the supported range.
    #[error("Invalid longitude: {0} (must be {MIN_LON} to {MAX_LON})")]
    InvalidLongitude(f64),
}

/// A geographic coordinate in floating-point degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lon: f64,
}

impl Coordinate {
    /// Create a validated coordinate.
    ///
    /// # Errors
    ///
    /// Returns `CoordError` if latitude or longitude is outside the
    /// supported range.
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordError> {
        if !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(CoordError::InvalidLatitude(lat));
        }
        if !(MIN_LON..=MAX_LON).contains(&lon) {
            return Err(CoordError::InvalidLongitude(lon));
        }
        Ok(Self { lat, lon })
    }

    /// Round to the 5-decimal cache key.
    pub fn rounded(&self) -> RoundedCoord {
        RoundedCoord::from(*self)
    }
}

/// A coordinate rounded to five decimal places, stored as scaled integers.
///
/// This is the hashable identity used by every coordinate-keyed cache.
/// Two fixes within ~1.1 m of each other produce the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoundedCoord {
    /// Latitude in 1e-5 degree units.
    pub lat_e5: i32,
    /// Longitude in 1e-5 degree units.
    pub lon_e5: i32,
}

impl From<Coordinate> for RoundedCoord {
    fn from(coord: Coordinate) -> Self {
        Self {
            lat_e5: (coord.lat * 1e5).round() as i32,
            lon_e5: (coord.lon * 1e5).round() as i32,
        }
    }
}

impl RoundedCoord {
    /// Latitude in degrees, as rounded.
    pub fn lat(&self) -> f64 {
        self.lat_e5 as f64 / 1e5
    }

    /// Longitude in degrees, as rounded.
    pub fn lon(&self) -> f64 {
        self.lon_e5 as f64 / 1e5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinate() {
        let coord = Coordinate::new(40.7128, -74.0060);
        assert!(coord.is_ok());
    }

    #[test]
    fn test_invalid_latitude() {
        let result = Coordinate::new(90.5, 0.0);
        assert_eq!(result.unwrap_err(), CoordError::InvalidLatitude(90.5));
    }

    #[test]
    fn test_invalid_longitude() {
        let result = Coordinate::new(0.0, -181.0);
        assert_eq!(result.unwrap_err(), CoordError::InvalidLongitude(-181.0));
    }

    #[test]
    fn test_rounding_absorbs_jitter() {
        let a = Coordinate::new(40.000001, -73.000004).unwrap();
        let b = Coordinate::new(40.000003, -73.000001).unwrap();
        assert_eq!(a.rounded(), b.rounded());
    }

    #[test]
    fn test_rounding_distinguishes_beyond_jitter() {
        let a = Coordinate::new(40.00000, -73.00000).unwrap();
        let b = Coordinate::new(40.00002, -73.00000).unwrap();
        assert_ne!(a.rounded(), b.rounded());
    }

    #[test]
    fn test_rounded_back_to_degrees() {
        let coord = Coordinate::new(51.50735, -0.12776).unwrap();
        let key = coord.rounded();
        assert!((key.lat() - 51.50735).abs() < 1e-9);
        assert!((key.lon() - -0.12776).abs() < 1e-9);
    }

    #[test]
    fn test_negative_coordinates_round_toward_nearest() {
        let coord = Coordinate::new(-33.868819, 151.209295).unwrap();
        let key = coord.rounded();
        assert_eq!(key.lat_e5, -3386882);
        assert_eq!(key.lon_e5, 15120930);
    }
}
