//! Structured placemarks and the compact two-line address format.

use std::fmt;

/// Address components from the primary (device-style) provider.
///
/// Every field is optional; providers fill what they know. Consumed once by
/// the formatter and discarded, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placemark {
    /// House or building number.
    pub house_number: Option<String>,
    /// Street name.
    pub street: Option<String>,
    /// City-level locality.
    pub locality: Option<String>,
    /// Neighborhood-level locality, used only when no city exists.
    pub sub_locality: Option<String>,
    /// State/province. Excluded from the city chain; last-resort only.
    pub administrative_area: Option<String>,
    /// County. Excluded from the city chain; very last resort.
    pub sub_administrative_area: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// Legacy ZIP field some providers still populate.
    pub zip: Option<String>,
    /// Country name.
    pub country: Option<String>,
}

/// The compact two-line address: "{house} {street}" over
/// "{city} {zip}, {country}".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactAddress {
    /// Street line; may be empty.
    pub line1: String,
    /// Locality line; may be empty.
    pub line2: String,
}

impl CompactAddress {
    /// Build from the two lines, yielding `None` when both are empty;
    /// "no address" is never represented as an empty string.
    pub fn from_lines(line1: String, line2: String) -> Option<Self> {
        if line1.is_empty() && line2.is_empty() {
            None
        } else {
            Some(Self { line1, line2 })
        }
    }

    /// The label text: non-empty lines joined by a newline.
    pub fn text(&self) -> String {
        match (self.line1.is_empty(), self.line2.is_empty()) {
            (false, false) => format!("{}\n{}", self.line1, self.line2),
            (false, true) => self.line1.clone(),
            (true, _) => self.line2.clone(),
        }
    }
}

impl fmt::Display for CompactAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// First value that is present and non-blank.
pub(crate) fn first_nonempty<'a>(values: &[Option<&'a str>]) -> Option<&'a str> {
    values
        .iter()
        .flatten()
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}

/// Join the present, non-blank parts with `sep`.
pub(crate) fn join_nonempty(parts: &[Option<&str>], sep: &str) -> String {
    parts
        .iter()
        .flatten()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Format a primary-provider placemark into the compact address.
///
/// The city chain stops at locality-level fields; administrative and
/// sub-administrative areas are consulted only when that chain is empty, in
/// that order, so a county name never displaces a real city.
pub fn format_placemark(place: &Placemark) -> Option<CompactAddress> {
    let house = place.house_number.as_deref();
    let street = place.street.as_deref();
    let line1 = join_nonempty(&[house, street], " ");

    let city = first_nonempty(&[place.locality.as_deref(), place.sub_locality.as_deref()])
        .or_else(|| first_nonempty(&[place.administrative_area.as_deref()]))
        .or_else(|| first_nonempty(&[place.sub_administrative_area.as_deref()]));
    let zip = first_nonempty(&[place.postal_code.as_deref(), place.zip.as_deref()]);

    let city_zip = join_nonempty(&[city, zip], " ");
    let line2 = join_nonempty(
        &[
            if city_zip.is_empty() {
                None
            } else {
                Some(city_zip.as_str())
            },
            place.country.as_deref(),
        ],
        ", ",
    );

    CompactAddress::from_lines(line1, line2)
}
