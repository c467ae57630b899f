use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::feed::Progress;
use crate::renderer::Altitude;

/// A normalised receiver record with a known position.
#[derive(Debug, Clone, PartialEq)]
pub struct AircraftRecord {
    pub hex: String,
    pub flight: String,
    pub altitude: Option<Altitude>,
    pub speed: Option<f64>,
    pub track: Option<f64>,
    pub lat: f64,
    pub lon: f64,
    pub seen: f64,
    pub seen_pos: Option<f64>,
    pub squawk: Option<String>,
    pub registration: Option<String>,
    pub aircraft_type: Option<String>,
}

impl AircraftRecord {
    /// Time the position was received, given the snapshot time.
    pub fn position_time(&self, now: f64) -> f64 {
        now - self.seen_pos.unwrap_or(self.seen)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DataSource {
    Replay,
    Dump1090,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FeedStats {
    pub total_updates: usize,
    pub outliers_detected: u64,
    pub position_corrections: u64,
    pub heading_corrections: u64,
    pub active_aircraft: usize,
    pub data_source: DataSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
}

impl FeedStats {
    pub fn new(data_source: DataSource) -> Self {
        Self {
            total_updates: 0,
            outliers_detected: 0,
            position_corrections: 0,
            heading_corrections: 0,
            active_aircraft: 0,
            data_source,
            progress: None,
        }
    }
}
