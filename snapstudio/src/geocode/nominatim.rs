//! Nominatim-style fallback reverse geocoder.

use serde::Deserialize;
use tracing::debug;

use super::placemark::{first_nonempty, join_nonempty, CompactAddress};
use super::{FallbackGeocoder, GeocodeError};
use crate::coord::Coordinate;

/// Public Nominatim instance.
pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org";
/// Descriptive client identifier, required by the Nominatim usage policy.
pub const DEFAULT_USER_AGENT: &str = "snapstudio/0.1 (+https://github.com/snapstudio/snapstudio)";
/// Bounded request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 6;

/// The `address` object of a Nominatim reverse-geocode response.
///
/// Field names follow the wire format; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OsmAddress {
    /// House or building number.
    pub house_number: Option<String>,
    /// Street name.
    pub road: Option<String>,
    /// Pedestrian way, used when no road is present.
    pub pedestrian: Option<String>,
    /// Footway, used when no road is present.
    pub footway: Option<String>,
    /// Path, used when no road is present.
    pub path: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Town, for smaller settlements.
    pub town: Option<String>,
    /// Village.
    pub village: Option<String>,
    /// Hamlet.
    pub hamlet: Option<String>,
    /// Municipality.
    pub municipality: Option<String>,
    /// Suburb, last entry in the city chain.
    pub suburb: Option<String>,
    /// Postal code.
    pub postcode: Option<String>,
    /// Country name.
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<OsmAddress>,
}

/// Format an OSM address object into the compact two-line address.
///
/// Same intent as the primary formatter with the fallback provider's field
/// names: the street chain walks road-like ways, the city chain walks
/// settlement sizes down to suburb, and county/state fields are never
/// consulted; Nominatim's city chain is rich enough that the last-resort
/// rule never applies here.
pub fn format_osm(addr: &OsmAddress) -> Option<CompactAddress> {
    let road = first_nonempty(&[
        addr.road.as_deref(),
        addr.pedestrian.as_deref(),
        addr.footway.as_deref(),
        addr.path.as_deref(),
    ]);
    let line1 = join_nonempty(&[addr.house_number.as_deref(), road], " ");

    let city = first_nonempty(&[
        addr.city.as_deref(),
        addr.town.as_deref(),
        addr.village.as_deref(),
        addr.hamlet.as_deref(),
        addr.municipality.as_deref(),
        addr.suburb.as_deref(),
    ]);
    let city_zip = join_nonempty(&[city, addr.postcode.as_deref()], " ");
    let line2 = join_nonempty(
        &[
            if city_zip.is_empty() {
                None
            } else {
                Some(city_zip.as_str())
            },
            addr.country.as_deref(),
        ],
        ", ",
    );

    CompactAddress::from_lines(line1, line2)
}

/// Blocking HTTP client against a Nominatim `/reverse` endpoint.
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl NominatimGeocoder {
    /// Create a geocoder against the public endpoint with defaults.
    ///
    /// # Errors
    ///
    /// Returns `GeocodeError::Http` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, GeocodeError> {
        Self::with_config(DEFAULT_ENDPOINT, DEFAULT_USER_AGENT, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a geocoder with a custom endpoint, user agent, and timeout.
    ///
    /// # Errors
    ///
    /// Returns `GeocodeError::Http` if the HTTP client cannot be built.
    pub fn with_config(
        endpoint: impl Into<String>,
        user_agent: &str,
        timeout_secs: u64,
    ) -> Result<Self, GeocodeError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GeocodeError::Http(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl FallbackGeocoder for NominatimGeocoder {
    fn reverse_geocode(&self, coord: Coordinate) -> Result<Option<OsmAddress>, GeocodeError> {
        let url = format!(
            "{}/reverse?format=json&lat={}&lon={}&zoom=18&addressdetails=1",
            self.endpoint, coord.lat, coord.lon
        );
        debug!(%url, "Fallback reverse geocode");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| GeocodeError::Http(format!("Request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(GeocodeError::Http(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }
        let body = response
            .text()
            .map_err(|e| GeocodeError::Http(format!("Failed to read response: {e}")))?;
        let parsed: ReverseResponse =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Parse(e.to_string()))?;
        Ok(parsed.address)
    }
}
