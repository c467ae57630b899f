use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub max_speed_kts: f64,
    pub max_jump_km: f64,
    pub min_time_diff_s: f64,
    pub history_size: usize,
    pub outlier_distance_km: f64,
    pub outlier_speed_multiplier: f64,
    pub track_smooth_alpha: f64,
    pub movement_blend_alpha: f64,
    pub min_track_change_deg: f64,
    pub use_movement_heading: bool,
    pub heading_confidence_km: f64,
    pub heading_mismatch_deg: f64,
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub stale_after: Duration,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_speed_kts: 750.0,
            max_jump_km: 15.0,
            min_time_diff_s: 0.3,
            history_size: 200,
            outlier_distance_km: 8.0,
            outlier_speed_multiplier: 2.5,
            track_smooth_alpha: 0.4,
            movement_blend_alpha: 0.7,
            min_track_change_deg: 5.0,
            use_movement_heading: true,
            heading_confidence_km: 0.1,
            heading_mismatch_deg: 45.0,
            stale_after: Duration::from_secs(600),
        }
    }
}

/// Only aircraft within `radius_km` of the center are shown, nearest first.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub enabled: bool,
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_km: f64,
    pub max_aircraft: usize,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            center_lat: 40.0,
            center_lon: 29.0,
            radius_km: 400.0,
            max_aircraft: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    pub enabled: bool,
    pub max_points: usize,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_points: 50,
        }
    }
}
