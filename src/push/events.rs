use serde::{Deserialize, Serialize};
use strum_macros::IntoStaticStr;
use utoipa::ToSchema;

use crate::renderer::{AircraftReport, MarkerSnapshot};
use crate::tracking::FeedStats;

/// Server → client messages, framed as `{"event": <name>, "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PushEvent {
    InitialData(InitialData),
    AircraftData(Vec<AircraftReport>),
    Stats(FeedStats),
    Pong(Pong),
}

impl PushEvent {
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InitialData {
    pub stats: FeedStats,
    pub markers: Vec<MarkerSnapshot>,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pong {
    pub timestamp: f64,
}

/// Client → server messages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    Ping,
}
