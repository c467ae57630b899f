use serde::Deserialize;

use crate::renderer::Altitude;
use crate::tracking::AircraftRecord;

/// One dump1090 `aircraft.json` document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    pub now: Option<f64>,
    #[serde(default)]
    pub aircraft: Vec<RawAircraft>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAircraft {
    pub hex: Option<String>,
    pub flight: Option<String>,
    pub altitude: Option<Altitude>,
    pub alt_baro: Option<Altitude>,
    pub alt_geom: Option<Altitude>,
    pub speed: Option<f64>,
    pub gs: Option<f64>,
    pub track: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub seen: Option<f64>,
    pub seen_pos: Option<f64>,
    pub squawk: Option<String>,
    #[serde(rename = "r")]
    pub registration: Option<String>,
    #[serde(rename = "t")]
    pub aircraft_type: Option<String>,
}

impl Snapshot {
    /// Snapshot time, or `fallback` when the document carries none.
    pub fn time_or(&self, fallback: f64) -> f64 {
        self.now.unwrap_or(fallback)
    }

    pub fn records(self) -> Vec<AircraftRecord> {
        self.aircraft.into_iter().filter_map(normalize).collect()
    }
}

/// Drops records without a position and resolves the alternative field names
/// used by different dump1090 versions.
pub fn normalize(raw: RawAircraft) -> Option<AircraftRecord> {
    let lat = raw.lat?;
    let lon = raw.lon?;

    Some(AircraftRecord {
        hex: raw.hex.unwrap_or_default().trim().to_lowercase(),
        flight: raw.flight.unwrap_or_default().trim().to_string(),
        altitude: raw.altitude.or(raw.alt_baro).or(raw.alt_geom),
        speed: raw.speed.or(raw.gs),
        track: raw.track,
        lat,
        lon,
        seen: raw.seen.unwrap_or(0.0),
        seen_pos: raw.seen_pos,
        squawk: raw.squawk,
        registration: raw.registration,
        aircraft_type: raw.aircraft_type,
    })
}
