use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Reads durations written as `"5s"`, `"10m"`, `"24h"`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}
