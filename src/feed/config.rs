use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::tracking::DataSource;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub source: DataSource,
    pub replay: ReplayConfig,
    pub dump1090: Dump1090Config,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source: DataSource::Replay,
            replay: ReplayConfig::default(),
            dump1090: Dump1090Config::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub dir: PathBuf,
    /// 1.0 is real time, 2.0 twice as fast.
    pub playback_speed: f64,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub exit_when_done: bool,
    /// Wall-clock gap between recorded snapshots at normal speed.
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub interval: Duration,
}

impl ReplayConfig {
    pub fn pace(&self) -> Duration {
        if self.playback_speed > 0.0 {
            self.interval.div_f64(self.playback_speed)
        } else {
            self.interval
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("json_files"),
            playback_speed: 1.0,
            looping: false,
            exit_when_done: true,
            interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Dump1090Config {
    pub url: String,
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub poll_interval: Duration,
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub timeout: Duration,
    pub max_consecutive_errors: u32,
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub backoff: Duration,
}

impl Default for Dump1090Config {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/data/aircraft.json".to_string(),
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(8),
            max_consecutive_errors: 5,
            backoff: Duration::from_secs(30),
        }
    }
}
