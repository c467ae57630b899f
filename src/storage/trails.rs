use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use super::error::TrailError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS trail_points (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hex_id TEXT NOT NULL,
    lat REAL NOT NULL,
    lon REAL NOT NULL,
    altitude REAL,
    speed REAL,
    track REAL,
    timestamp REAL NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_trail_points_hex_timestamp ON trail_points (hex_id, timestamp);
CREATE TABLE IF NOT EXISTS trail_metadata (
    hex_id TEXT PRIMARY KEY,
    flight_code TEXT,
    aircraft_type TEXT,
    registration TEXT,
    point_count INTEGER NOT NULL DEFAULT 0,
    first_seen TEXT NOT NULL,
    last_seen TEXT NOT NULL,
    max_altitude REAL,
    avg_speed REAL
);
";

/// A point to record for one aircraft.
#[derive(Debug, Clone)]
pub struct TrailPoint {
    pub hex: String,
    pub lat: f64,
    pub lon: f64,
    pub timestamp: f64,
    pub altitude: Option<f64>,
    pub speed: Option<f64>,
    pub track: Option<f64>,
    pub flight: Option<String>,
    pub aircraft_type: Option<String>,
    pub registration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredPoint {
    pub lat: f64,
    pub lon: f64,
    pub altitude: Option<f64>,
    pub speed: Option<f64>,
    pub track: Option<f64>,
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrailMetadata {
    pub flight_code: Option<String>,
    pub aircraft_type: Option<String>,
    pub registration: Option<String>,
    pub point_count: u64,
    pub first_seen: String,
    pub last_seen: String,
    pub max_altitude: Option<f64>,
    pub avg_speed: Option<f64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LongestTrail {
    pub hex_id: String,
    pub point_count: u64,
    pub flight_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrailStatistics {
    pub total_points: u64,
    pub total_aircraft: u64,
    pub longest_trail: Option<LongestTrail>,
    pub db_size_mb: f64,
}

/// SQLite-backed history of accepted positions.
pub struct TrailStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl TrailStore {
    pub fn open(path: &Path) -> Result<Self, TrailError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        log::info!("Trail store ready at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self, TrailError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, TrailError> {
        self.conn.lock().map_err(|_| TrailError::Poisoned)
    }

    pub fn save_point(&self, point: &TrailPoint) -> Result<(), TrailError> {
        let mut conn = self.conn()?;
        let now = Utc::now();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO trail_points (hex_id, lat, lon, altitude, speed, track, timestamp, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                point.hex,
                point.lat,
                point.lon,
                point.altitude,
                point.speed,
                point.track,
                point.timestamp,
                now.timestamp(),
            ],
        )?;

        tx.execute(
            "INSERT INTO trail_metadata
                (hex_id, flight_code, aircraft_type, registration, point_count,
                 first_seen, last_seen, max_altitude, avg_speed)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5, ?6, ?7)
             ON CONFLICT(hex_id) DO UPDATE SET
                flight_code = COALESCE(excluded.flight_code, flight_code),
                aircraft_type = COALESCE(excluded.aircraft_type, aircraft_type),
                registration = COALESCE(excluded.registration, registration),
                point_count = point_count + 1,
                last_seen = excluded.last_seen,
                max_altitude = MAX(COALESCE(max_altitude, 0), COALESCE(excluded.max_altitude, 0)),
                avg_speed = (COALESCE(avg_speed, 0) * point_count + COALESCE(excluded.avg_speed, 0))
                            / (point_count + 1)",
            params![
                point.hex,
                point.flight,
                point.aircraft_type,
                point.registration,
                now.to_rfc3339(),
                point.altitude,
                point.speed,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// The most recent `limit` points, oldest first.
    pub fn trail(&self, hex: &str, limit: usize) -> Result<Vec<StoredPoint>, TrailError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT lat, lon, altitude, speed, track, timestamp
             FROM trail_points
             WHERE hex_id = ?1
             ORDER BY timestamp DESC
             LIMIT ?2",
        )?;
        let mut points = stmt
            .query_map(params![hex, limit as i64], |row| {
                Ok(StoredPoint {
                    lat: row.get(0)?,
                    lon: row.get(1)?,
                    altitude: row.get(2)?,
                    speed: row.get(3)?,
                    track: row.get(4)?,
                    timestamp: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        points.reverse();
        Ok(points)
    }

    pub fn metadata(&self, hex: &str) -> Result<Option<TrailMetadata>, TrailError> {
        let conn = self.conn()?;
        let metadata = conn
            .query_row(
                "SELECT flight_code, aircraft_type, registration, point_count,
                        first_seen, last_seen, max_altitude, avg_speed
                 FROM trail_metadata
                 WHERE hex_id = ?1",
                params![hex],
                |row| {
                    Ok(TrailMetadata {
                        flight_code: row.get(0)?,
                        aircraft_type: row.get(1)?,
                        registration: row.get(2)?,
                        point_count: row.get::<_, i64>(3)? as u64,
                        first_seen: row.get(4)?,
                        last_seen: row.get(5)?,
                        max_altitude: row.get(6)?,
                        avg_speed: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(metadata)
    }

    pub fn cleanup(&self, retention: Duration) -> Result<(usize, usize), TrailError> {
        let retention = chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now()
            .checked_sub_signed(retention)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.cleanup_before(cutoff)
    }

    /// Deletes points recorded before `cutoff` and metadata left without points.
    pub fn cleanup_before(&self, cutoff: DateTime<Utc>) -> Result<(usize, usize), TrailError> {
        let conn = self.conn()?;
        let points = conn.execute(
            "DELETE FROM trail_points WHERE created_at < ?1",
            params![cutoff.timestamp()],
        )?;
        let aircraft = conn.execute(
            "DELETE FROM trail_metadata
             WHERE hex_id NOT IN (SELECT DISTINCT hex_id FROM trail_points)",
            [],
        )?;
        log::info!(
            "Trail cleanup: {} points and {} aircraft removed",
            points,
            aircraft
        );
        Ok((points, aircraft))
    }

    pub fn statistics(&self) -> Result<TrailStatistics, TrailError> {
        let conn = self.conn()?;
        let total_points: i64 =
            conn.query_row("SELECT COUNT(*) FROM trail_points", [], |row| row.get(0))?;
        let total_aircraft: i64 =
            conn.query_row("SELECT COUNT(*) FROM trail_metadata", [], |row| row.get(0))?;
        let longest_trail = conn
            .query_row(
                "SELECT hex_id, point_count, flight_code
                 FROM trail_metadata
                 ORDER BY point_count DESC
                 LIMIT 1",
                [],
                |row| {
                    Ok(LongestTrail {
                        hex_id: row.get(0)?,
                        point_count: row.get::<_, i64>(1)? as u64,
                        flight_code: row.get(2)?,
                    })
                },
            )
            .optional()?;

        let db_size_mb = match &self.path {
            Some(path) => {
                let bytes = std::fs::metadata(path)?.len() as f64;
                (bytes / (1024.0 * 1024.0) * 100.0).round() / 100.0
            }
            None => 0.0,
        };

        Ok(TrailStatistics {
            total_points: total_points as u64,
            total_aircraft: total_aircraft as u64,
            longest_trail,
            db_size_mb,
        })
    }
}

/// Periodically removes points older than `retention`.
pub fn spawn_cleanup(
    store: Arc<TrailStore>,
    retention: Duration,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = store.cleanup(retention) {
                log::error!("Trail cleanup failed: {}", e);
            }
        }
    })
}
