use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

use super::config::ValidationConfig;
use super::geo::{bearing_deg, haversine_km, implied_speed_kts, KM_PER_DEG_LAT, MS_PER_KT};

/// A timestamped position report (seconds since the epoch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fix {
    pub lat: f64,
    pub lon: f64,
    pub ts: f64,
    pub track: Option<f64>,
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Assessment {
    FirstPosition,
    Valid,
    BackwardsTime,
    TooFrequent,
    BigJump { km: f64 },
    Overspeed { kts: f64 },
    PatternOutlier { km: f64 },
}

impl Assessment {
    pub fn is_outlier(&self) -> bool {
        !matches!(self, Assessment::FirstPosition | Assessment::Valid)
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assessment::FirstPosition => write!(f, "first_position"),
            Assessment::Valid => write!(f, "valid"),
            Assessment::BackwardsTime => write!(f, "backwards_time"),
            Assessment::TooFrequent => write!(f, "too_frequent"),
            Assessment::BigJump { km } => write!(f, "big_jump_{:.1}km", km),
            Assessment::Overspeed { kts } => write!(f, "overspeed_{:.0}kts", kts),
            Assessment::PatternOutlier { km } => write!(f, "pattern_outlier_{:.1}km", km),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    /// The accepted fix, or the replacement for a rejected one.
    pub fix: Fix,
    pub assessment: Assessment,
}

impl Verdict {
    pub fn corrected(&self) -> bool {
        self.assessment.is_outlier()
    }
}

/// Rejects implausible position reports for one aircraft and keeps the
/// accepted ones as a bounded history.
#[derive(Debug)]
pub struct PositionValidator {
    config: ValidationConfig,
    history: VecDeque<Fix>,
    last_valid: Option<Fix>,
    last_track: Option<f64>,
    last_speed: Option<f64>,
    outlier_count: u64,
    total_updates: u64,
    first_seen: Option<f64>,
    last_seen: Option<f64>,
}

impl PositionValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            history: VecDeque::with_capacity(config.history_size.max(1)),
            last_valid: None,
            last_track: None,
            last_speed: None,
            outlier_count: 0,
            total_updates: 0,
            first_seen: None,
            last_seen: None,
        }
    }

    pub fn add_position(&mut self, fix: Fix) -> Verdict {
        self.total_updates += 1;
        self.last_seen = Some(fix.ts);

        if self.history.is_empty() {
            self.first_seen = Some(fix.ts);
            self.accept(fix);
            return Verdict {
                fix,
                assessment: Assessment::FirstPosition,
            };
        }

        match self.check_outlier(&fix) {
            Some(assessment) => {
                self.outlier_count += 1;
                Verdict {
                    fix: self.corrected_position(&fix),
                    assessment,
                }
            }
            None => {
                self.accept(fix);
                Verdict {
                    fix,
                    assessment: Assessment::Valid,
                }
            }
        }
    }

    fn accept(&mut self, fix: Fix) {
        if self.history.len() >= self.config.history_size.max(1) {
            self.history.pop_front();
        }
        self.history.push_back(fix);
        self.last_valid = Some(fix);
        if fix.track.is_some() {
            self.last_track = fix.track;
        }
        if fix.speed.is_some() {
            self.last_speed = fix.speed;
        }
    }

    fn check_outlier(&self, fix: &Fix) -> Option<Assessment> {
        let prev = self.history.back()?;

        let dt = fix.ts - prev.ts;
        if dt <= 0.0 {
            return Some(Assessment::BackwardsTime);
        }
        if dt < self.config.min_time_diff_s {
            return Some(Assessment::TooFrequent);
        }

        let km = haversine_km(prev.lat, prev.lon, fix.lat, fix.lon);
        if km > self.config.max_jump_km {
            return Some(Assessment::BigJump { km });
        }

        let kts = implied_speed_kts(prev.lat, prev.lon, prev.ts, fix.lat, fix.lon, fix.ts);
        if kts > self.config.max_speed_kts {
            return Some(Assessment::Overspeed { kts });
        }

        if self.history.len() >= 3 {
            let (lat_sum, lon_sum) = self
                .history
                .iter()
                .rev()
                .take(3)
                .fold((0.0, 0.0), |(lat, lon), p| (lat + p.lat, lon + p.lon));
            let km = haversine_km(lat_sum / 3.0, lon_sum / 3.0, fix.lat, fix.lon);

            if let Some(speed) = self.known_speed() {
                let expected_km = speed * MS_PER_KT * dt / 1000.0 * self.config.outlier_speed_multiplier;
                if km > self.config.outlier_distance_km.max(expected_km) {
                    return Some(Assessment::PatternOutlier { km });
                }
            }
        }

        None
    }

    /// Dead-reckons from the last two accepted fixes, or falls back to the
    /// last accepted fix stamped with the outlier's time.
    fn corrected_position(&self, outlier: &Fix) -> Fix {
        let Some(last_valid) = self.last_valid else {
            return *outlier;
        };

        if let (Some(speed), [.., prev1, prev2]) = (self.known_speed(), self.last_two().as_slice()) {
            if prev2.ts - prev1.ts > 0.0 {
                if let Some(bearing) = bearing_deg(prev1.lat, prev1.lon, prev2.lat, prev2.lon) {
                    let elapsed = outlier.ts - prev2.ts;
                    let distance_km = speed * MS_PER_KT * elapsed / 1000.0;
                    let bearing = bearing.to_radians();
                    let lat = prev2.lat + (distance_km / KM_PER_DEG_LAT) * bearing.cos();
                    let lon = prev2.lon
                        + (distance_km / (KM_PER_DEG_LAT * prev2.lat.to_radians().cos()))
                            * bearing.sin();

                    return Fix {
                        lat,
                        lon,
                        ts: outlier.ts,
                        track: self.last_track,
                        speed: self.last_speed,
                    };
                }
            }
        }

        Fix {
            ts: outlier.ts,
            ..last_valid
        }
    }

    fn known_speed(&self) -> Option<f64> {
        self.last_speed.filter(|s| *s > 0.0)
    }

    fn last_two(&self) -> Vec<Fix> {
        self.history.iter().rev().take(2).rev().copied().collect()
    }

    /// Direction of actual movement, falling back to the last reported track
    /// when the last two fixes are too close together to trust.
    pub fn movement_heading(&self) -> Option<f64> {
        match self.last_two().as_slice() {
            [p1, p2] => {
                let km = haversine_km(p1.lat, p1.lon, p2.lat, p2.lon);
                if km >= self.config.heading_confidence_km {
                    bearing_deg(p1.lat, p1.lon, p2.lat, p2.lon).or(self.last_track)
                } else {
                    self.last_track
                }
            }
            _ => self.last_track,
        }
    }

    pub fn history(&self) -> &VecDeque<Fix> {
        &self.history
    }

    pub fn newest(&self) -> Option<&Fix> {
        self.history.back()
    }

    pub fn last_valid(&self) -> Option<Fix> {
        self.last_valid
    }

    pub fn last_track(&self) -> Option<f64> {
        self.last_track
    }

    pub fn outlier_count(&self) -> u64 {
        self.outlier_count
    }

    pub fn total_updates(&self) -> u64 {
        self.total_updates
    }

    pub fn total_distance_km(&self) -> f64 {
        self.history
            .iter()
            .zip(self.history.iter().skip(1))
            .map(|(a, b)| haversine_km(a.lat, a.lon, b.lat, b.lon))
            .sum()
    }

    pub fn flight_duration_s(&self) -> f64 {
        match (self.first_seen, self.last_seen) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(lat: f64, lon: f64, ts: f64) -> Fix {
        Fix {
            lat,
            lon,
            ts,
            track: None,
            speed: None,
        }
    }

    fn moving(lat: f64, lon: f64, ts: f64, speed: f64) -> Fix {
        Fix {
            speed: Some(speed),
            track: Some(0.0),
            ..fix(lat, lon, ts)
        }
    }

    fn validator() -> PositionValidator {
        PositionValidator::new(ValidationConfig::default())
    }

    #[test]
    fn first_position_is_accepted() {
        let mut v = validator();
        let verdict = v.add_position(fix(40.0, 29.0, 100.0));
        assert_eq!(verdict.assessment, Assessment::FirstPosition);
        assert!(!verdict.corrected());
        assert_eq!(v.history().len(), 1);
    }

    #[test]
    fn plausible_update_is_accepted() {
        let mut v = validator();
        v.add_position(fix(40.0, 29.0, 0.0));
        let verdict = v.add_position(fix(40.02, 29.0, 10.0));
        assert_eq!(verdict.assessment, Assessment::Valid);
        assert_eq!(v.history().len(), 2);
    }

    #[test]
    fn backwards_time_falls_back_to_last_valid_position() {
        let mut v = validator();
        v.add_position(fix(40.0, 29.0, 50.0));
        let verdict = v.add_position(fix(40.01, 29.0, 40.0));

        assert_eq!(verdict.assessment, Assessment::BackwardsTime);
        assert_eq!(verdict.fix.lat, 40.0);
        assert_eq!(verdict.fix.ts, 40.0);
        assert_eq!(v.outlier_count(), 1);
        assert_eq!(v.history().len(), 1);
    }

    #[test]
    fn rejects_too_frequent_updates() {
        let mut v = validator();
        v.add_position(fix(40.0, 29.0, 10.0));
        let verdict = v.add_position(fix(40.0, 29.0, 10.1));
        assert_eq!(verdict.assessment, Assessment::TooFrequent);
    }

    #[test]
    fn rejects_big_jump() {
        let mut v = validator();
        v.add_position(fix(40.0, 29.0, 0.0));
        let verdict = v.add_position(fix(40.18, 29.0, 100.0));
        assert!(matches!(verdict.assessment, Assessment::BigJump { km } if km > 19.0));
        assert!(verdict.assessment.to_string().starts_with("big_jump_20"));
    }

    #[test]
    fn rejects_overspeed() {
        let mut v = validator();
        v.add_position(fix(40.0, 29.0, 0.0));
        // ~10 km in 20 s
        let verdict = v.add_position(fix(40.09, 29.0, 20.0));
        assert!(matches!(verdict.assessment, Assessment::Overspeed { kts } if kts > 750.0));
    }

    #[test]
    fn pattern_outlier_is_dead_reckoned() {
        let mut v = validator();
        v.add_position(moving(40.00, 29.0, 0.0, 100.0));
        v.add_position(moving(40.01, 29.0, 30.0, 100.0));
        v.add_position(moving(40.02, 29.0, 60.0, 100.0));

        // ~13 km east in a minute: under the jump and speed limits, but far
        // from where a 100 kt aircraft can be
        let verdict = v.add_position(moving(40.02, 29.15245, 120.0, 100.0));

        assert!(matches!(
            verdict.assessment,
            Assessment::PatternOutlier { km } if km > 12.0
        ));
        assert!((verdict.fix.lat - 40.0477).abs() < 1e-3, "{:?}", verdict.fix);
        assert_eq!(verdict.fix.lon, 29.0);
        assert_eq!(verdict.fix.ts, 120.0);
        assert_eq!(v.history().len(), 3);
    }

    #[test]
    fn history_is_bounded() {
        let mut v = PositionValidator::new(ValidationConfig {
            history_size: 3,
            ..ValidationConfig::default()
        });
        for i in 0..5 {
            v.add_position(fix(40.0 + i as f64 * 0.01, 29.0, i as f64 * 30.0));
        }
        assert_eq!(v.history().len(), 3);
        assert_eq!(v.newest().unwrap().ts, 120.0);
    }

    #[test]
    fn movement_heading_needs_enough_separation() {
        let mut v = validator();
        v.add_position(Fix {
            track: Some(270.0),
            ..fix(40.0, 29.0, 0.0)
        });
        assert_eq!(v.movement_heading(), Some(270.0));

        // 20 m: below the confidence threshold
        v.add_position(fix(40.00018, 29.0, 10.0));
        assert_eq!(v.movement_heading(), Some(270.0));

        v.add_position(fix(40.02, 29.0, 40.0));
        let heading = v.movement_heading().unwrap();
        assert!(heading < 1e-6 || heading > 359.99, "got {}", heading);
    }

    #[test]
    fn distance_and_duration_accumulate() {
        let mut v = validator();
        v.add_position(fix(40.0, 29.0, 0.0));
        v.add_position(fix(40.01, 29.0, 30.0));
        v.add_position(fix(40.02, 29.0, 60.0));

        assert!((v.total_distance_km() - 2.224).abs() < 0.01);
        assert_eq!(v.flight_duration_s(), 60.0);
        assert_eq!(v.total_updates(), 3);
    }
}
