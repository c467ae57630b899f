use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::storage::{StoredPoint, TrailMetadata};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

const TRAIL_LIMIT: usize = 100;

#[derive(Debug, Serialize, ToSchema)]
pub struct TrailResponse {
    pub hex_id: String,
    pub trail: Vec<StoredPoint>,
    pub metadata: Option<TrailMetadata>,
}

#[utoipa::path(
    get,
    path = "/api/trail/{hex}",
    params(
        ("hex" = String, Path, description = "ICAO 24-bit address")
    ),
    responses(
        (status = 200, description = "Stored track, oldest point first", body = TrailResponse),
        (status = 503, description = "Trail storage disabled", body = ErrorResponse)
    ),
    tag = "trails"
)]
pub async fn get_trail(
    State(state): State<AppState>,
    Path(hex): Path<String>,
) -> ApiResult<Json<TrailResponse>> {
    let store = state
        .trails
        .as_ref()
        .ok_or(ApiError::Unavailable("storage_disabled"))?;

    let key = hex.to_lowercase();
    let trail = store.trail(&key, TRAIL_LIMIT)?;
    let metadata = store.metadata(&key)?;

    Ok(Json(TrailResponse {
        hex_id: hex,
        trail,
        metadata,
    }))
}
