use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One row of the aircraft registration feed, as it appears on the wire.
///
/// Column names follow the upstream CSV header. Missing columns
/// deserialize to empty strings, unknown columns are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct FeedRow {
    #[serde(default)]
    pub icao24: String,
    #[serde(default)]
    pub registration: String,
    #[serde(default, rename = "manufacturername")]
    pub manufacturer_name: String,
    #[serde(default, rename = "manufacturericao")]
    pub manufacturer_icao: String,
    #[serde(default)]
    pub model: String,
    #[serde(default, rename = "typecode")]
    pub type_code: String,
    #[serde(default, rename = "icaoaircrafttype")]
    pub icao_aircraft_type: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default, rename = "operatorcallsign")]
    pub operator_callsign: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default, rename = "serialnumber")]
    pub serial_number: String,
    #[serde(default)]
    pub built: String,
    #[serde(default, rename = "registeredcountry")]
    pub registered_country: String,
    #[serde(default, rename = "operatorcountry")]
    pub operator_country: String,
}

/// A normalized aircraft registration record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AircraftRecord {
    pub icao24: String,
    pub registration: String,
    pub manufacturer: String,
    pub model: String,
    pub type_code: String,
    pub icao_aircraft_type: String,
    pub operator: String,
    pub operator_callsign: String,
    pub owner: String,
    pub serial_number: String,
    pub built: String,
    pub country: String,
}

impl AircraftRecord {
    pub fn from_row(row: &FeedRow) -> AircraftRecord {
        let clean = |value: &str| value.trim().to_string();

        AircraftRecord {
            icao24: row.icao24.trim().to_lowercase(),
            registration: clean(&row.registration),
            manufacturer: first_non_empty(&[&row.manufacturer_name, &row.manufacturer_icao]),
            model: clean(&row.model),
            type_code: clean(&row.type_code),
            icao_aircraft_type: clean(&row.icao_aircraft_type),
            operator: clean(&row.operator),
            operator_callsign: clean(&row.operator_callsign),
            owner: clean(&row.owner),
            serial_number: clean(&row.serial_number),
            built: clean(&row.built),
            country: first_non_empty(&[&row.registered_country, &row.operator_country, &row.owner]),
        }
    }

    /// Rows carrying neither a registration nor an icao24 address are noise
    /// and get dropped during parsing.
    pub fn is_identified(&self) -> bool {
        !self.registration.is_empty() || !self.icao24.is_empty()
    }
}

pub fn first_non_empty(values: &[&str]) -> String {
    values
        .iter()
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Cheap shape check for tail numbers arriving through the HTTP layer.
pub fn looks_like_registration(text: &str) -> bool {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"^[A-Z0-9][A-Z0-9-]{0,15}$").unwrap();
    }

    RE.is_match(text)
}
