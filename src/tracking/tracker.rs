use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::feed::Progress;
use crate::renderer::{AircraftReport, Altitude, LatLon};
use crate::storage::{TrailPoint, TrailStore};

use super::config::{RegionConfig, TrailConfig, ValidationConfig};
use super::geo::{angle_difference, haversine_km, smooth_angle};
use super::types::{AircraftRecord, DataSource, FeedStats};
use super::validator::{Fix, PositionValidator};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LastPosition {
    pub lat: f64,
    pub lon: f64,
    pub age_seconds: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AircraftSummary {
    pub position_count: usize,
    pub outlier_count: u64,
    pub outlier_rate_pct: f64,
    pub last_position: LastPosition,
    pub last_track: Option<f64>,
    pub movement_heading: Option<f64>,
    pub total_distance_km: f64,
    pub flight_duration_seconds: u64,
}

/// Turns raw receiver snapshots into validated reports, one
/// [`PositionValidator`] per aircraft.
pub struct Tracker {
    validation: ValidationConfig,
    region: RegionConfig,
    trail: TrailConfig,
    validators: HashMap<String, PositionValidator>,
    stats: FeedStats,
    trails: Option<Arc<TrailStore>>,
}

impl Tracker {
    pub fn new(
        validation: ValidationConfig,
        region: RegionConfig,
        trail: TrailConfig,
        data_source: DataSource,
    ) -> Self {
        Self {
            validation,
            region,
            trail,
            validators: HashMap::new(),
            stats: FeedStats::new(data_source),
            trails: None,
        }
    }

    pub fn with_trail_store(mut self, store: Arc<TrailStore>) -> Self {
        self.trails = Some(store);
        self
    }

    pub fn process(&mut self, now: f64, records: Vec<AircraftRecord>) -> Vec<AircraftReport> {
        self.stats.total_updates = records.len();
        let selected = self.select(records);

        let validation = self.validation;
        let mut position_corrections = 0;
        let mut heading_corrections = 0;
        let mut reports = Vec::with_capacity(selected.len());

        for record in selected {
            if record.hex.is_empty() {
                continue;
            }

            let validator = self
                .validators
                .entry(record.hex.clone())
                .or_insert_with(|| PositionValidator::new(validation));

            let verdict = validator.add_position(Fix {
                lat: record.lat,
                lon: record.lon,
                ts: record.position_time(now),
                track: record.track,
                speed: record.speed,
            });
            if verdict.corrected() {
                log::debug!("{}: outlier rejected ({})", record.hex, verdict.assessment);
                position_corrections += 1;
            }

            let mut track = record.track;
            if validation.use_movement_heading {
                if let Some(movement) = validator.movement_heading() {
                    track = Some(match record.track {
                        Some(reported)
                            if angle_difference(movement, reported).abs()
                                > validation.heading_mismatch_deg =>
                        {
                            log::debug!(
                                "{}: reported track {:.0} disagrees with movement {:.0}",
                                record.hex,
                                reported,
                                movement
                            );
                            heading_corrections += 1;
                            movement
                        }
                        Some(reported) => smooth_angle(
                            movement,
                            reported,
                            validation.movement_blend_alpha,
                            validation.min_track_change_deg,
                        ),
                        None => movement,
                    });
                }
            }
            if let (Some(last), Some(current)) = (validator.last_track(), track) {
                track = Some(smooth_angle(
                    last,
                    current,
                    validation.track_smooth_alpha,
                    validation.min_track_change_deg,
                ));
            }

            let trail = if self.trail.enabled && validator.history().len() > 1 {
                downsample(validator.history(), self.trail.max_points)
            } else {
                Vec::new()
            };

            if let Some(store) = &self.trails {
                if !trail.is_empty() {
                    let point = TrailPoint {
                        hex: record.hex.clone(),
                        lat: verdict.fix.lat,
                        lon: verdict.fix.lon,
                        timestamp: verdict.fix.ts,
                        altitude: match &record.altitude {
                            Some(Altitude::Feet(ft)) => Some(*ft),
                            _ => None,
                        },
                        speed: record.speed,
                        track,
                        flight: Some(record.flight.clone()).filter(|f| !f.is_empty()),
                        aircraft_type: record.aircraft_type.clone(),
                        registration: record.registration.clone(),
                    };
                    if let Err(e) = store.save_point(&point) {
                        log::warn!("Failed to store trail point for {}: {}", record.hex, e);
                    }
                }
            }

            reports.push(AircraftReport {
                id: record.hex,
                latitude: Some(verdict.fix.lat),
                longitude: Some(verdict.fix.lon),
                altitude: record.altitude,
                ground_speed: record.speed,
                track,
                callsign: Some(record.flight).filter(|f| !f.is_empty()),
                corrected: verdict.corrected(),
                trail,
            });
        }

        self.stats.position_corrections += position_corrections;
        self.stats.heading_corrections += heading_corrections;
        self.stats.active_aircraft = self.validators.len();
        self.stats.outliers_detected = self.validators.values().map(|v| v.outlier_count()).sum();

        if position_corrections > 0 || heading_corrections > 0 {
            log::info!(
                "{} aircraft processed, {} position and {} heading corrections",
                reports.len(),
                position_corrections,
                heading_corrections
            );
        }

        self.prune_stale(now);
        reports
    }

    /// Region filter (nearest first) or a plain cap.
    fn select(&self, records: Vec<AircraftRecord>) -> Vec<AircraftRecord> {
        let region = &self.region;
        if !region.enabled {
            return records.into_iter().take(region.max_aircraft).collect();
        }

        let total = records.len();
        let mut within: Vec<(f64, AircraftRecord)> = records
            .into_iter()
            .map(|r| {
                let km = haversine_km(region.center_lat, region.center_lon, r.lat, r.lon);
                (km, r)
            })
            .filter(|(km, _)| *km <= region.radius_km)
            .collect();
        within.sort_by(|a, b| a.0.total_cmp(&b.0));

        log::debug!(
            "Region filter: {} of {} aircraft within {} km, showing at most {}",
            within.len(),
            total,
            region.radius_km,
            region.max_aircraft
        );

        within
            .into_iter()
            .take(region.max_aircraft)
            .map(|(_, r)| r)
            .collect()
    }

    fn prune_stale(&mut self, now: f64) {
        let cutoff = now - self.validation.stale_after.as_secs_f64();
        self.validators.retain(|hex, validator| match validator.newest() {
            Some(newest) if newest.ts < cutoff => {
                log::debug!("Dropping stale aircraft {}", hex);
                false
            }
            _ => true,
        });
    }

    pub fn stats(&self) -> FeedStats {
        self.stats.clone()
    }

    pub fn set_progress(&mut self, progress: Option<Progress>) {
        self.stats.progress = progress;
    }

    pub fn reset_counters(&mut self) {
        self.stats.position_corrections = 0;
        self.stats.heading_corrections = 0;
        self.stats.outliers_detected = 0;
    }

    pub fn active_aircraft(&self) -> usize {
        self.validators.len()
    }

    pub fn last_position(&self, hex: &str) -> Option<Fix> {
        self.validators.get(hex).and_then(|v| v.last_valid())
    }

    pub fn aircraft_summaries(&self, now: f64) -> BTreeMap<String, AircraftSummary> {
        self.validators
            .iter()
            .filter_map(|(hex, v)| {
                let newest = v.newest()?;
                let outlier_rate_pct = if v.total_updates() > 0 {
                    round_to(v.outlier_count() as f64 / v.total_updates() as f64 * 100.0, 1)
                } else {
                    0.0
                };
                Some((
                    hex.clone(),
                    AircraftSummary {
                        position_count: v.history().len(),
                        outlier_count: v.outlier_count(),
                        outlier_rate_pct,
                        last_position: LastPosition {
                            lat: round_to(newest.lat, 6),
                            lon: round_to(newest.lon, 6),
                            age_seconds: round_to(now - newest.ts, 1),
                        },
                        last_track: v.last_track(),
                        movement_heading: v.movement_heading(),
                        total_distance_km: round_to(v.total_distance_km(), 2),
                        flight_duration_seconds: v.flight_duration_s().max(0.0) as u64,
                    },
                ))
            })
            .collect()
    }
}

/// Every n-th point so that at most `max_points` of the most recent remain.
fn downsample(points: &VecDeque<Fix>, max_points: usize) -> Vec<LatLon> {
    if max_points == 0 {
        return Vec::new();
    }

    let step = (points.len() / max_points).max(1);
    let sampled: Vec<LatLon> = points
        .iter()
        .step_by(step)
        .map(|p| LatLon::new(p.lat, p.lon))
        .collect();
    let skip = sampled.len().saturating_sub(max_points);
    sampled.into_iter().skip(skip).collect()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
