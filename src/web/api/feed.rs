use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::feed::Progress;
use crate::storage::TrailStatistics;
use crate::tracking::{AircraftSummary, DataSource, FeedStats};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::Operator;
use crate::web::config::Permission;
use crate::web::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub active_aircraft: usize,
    pub connected_clients: usize,
    pub data_source: DataSource,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConfigSummary {
    pub data_source: DataSource,
    pub max_speed_kts: f64,
    pub max_jump_km: f64,
    pub use_movement_heading: bool,
    pub storage_enabled: bool,
    pub max_aircraft: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub stats: FeedStats,
    pub aircraft: BTreeMap<String, AircraftSummary>,
    pub connected_clients: usize,
    pub progress: Option<Progress>,
    pub database: Option<TrailStatistics>,
    pub config: ConfigSummary,
    pub timestamp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResetResponse {
    pub message: String,
    pub progress: Option<Progress>,
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "feed"
)]
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let (active_aircraft, data_source) = {
        let tracker = state.tracker.lock()?;
        (tracker.active_aircraft(), tracker.stats().data_source)
    };

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        active_aircraft,
        connected_clients: state.channel.client_count(),
        data_source,
    }))
}

#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Feed counters and per-aircraft validation state", body = StatsResponse),
        (status = 500, description = "Trail storage failure", body = ErrorResponse)
    ),
    tag = "feed"
)]
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let now = Utc::now();
    let (stats, aircraft) = {
        let tracker = state.tracker.lock()?;
        let seconds = now.timestamp_millis() as f64 / 1000.0;
        (tracker.stats(), tracker.aircraft_summaries(seconds))
    };
    let progress = state.feed.lock().await.progress();
    let database = state
        .trails
        .as_ref()
        .map(|store| store.statistics())
        .transpose()?;

    let config = &state.config;
    Ok(Json(StatsResponse {
        config: ConfigSummary {
            data_source: stats.data_source,
            max_speed_kts: config.validation.max_speed_kts,
            max_jump_km: config.validation.max_jump_km,
            use_movement_heading: config.validation.use_movement_heading,
            storage_enabled: state.trails.is_some(),
            max_aircraft: config.region.max_aircraft,
        },
        stats,
        aircraft,
        connected_clients: state.channel.client_count(),
        progress,
        database,
        timestamp: now.to_rfc3339(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/control/reset",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Replay rewound to the first file", body = ResetResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse),
        (status = 409, description = "Live source cannot be rewound", body = ErrorResponse)
    ),
    tag = "feed"
)]
pub async fn reset(
    State(state): State<AppState>,
    operator: Operator,
) -> ApiResult<Json<ResetResponse>> {
    operator.require(Permission::ControlFeed)?;

    let progress = {
        let mut feed = state.feed.lock().await;
        if !feed.reset() {
            return Err(ApiError::Conflict("live_source"));
        }
        feed.progress()
    };
    state.tracker.lock()?.reset_counters();

    log::info!("Replay reset by {}", operator.name);
    Ok(Json(ResetResponse {
        message: "replay rewound".to_string(),
        progress,
    }))
}
