use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::airports::{self, FeatureCollection, NearestAirport};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct NearestAirportResponse {
    pub hex_id: String,
    pub nearest_airport: NearestAirport,
}

#[utoipa::path(
    get,
    path = "/api/airports",
    responses(
        (status = 200, description = "Major airports as GeoJSON", body = FeatureCollection)
    ),
    tag = "map"
)]
pub async fn list_airports() -> Json<FeatureCollection> {
    Json(airports::geojson())
}

#[utoipa::path(
    get,
    path = "/api/nearest-airport/{hex}",
    params(
        ("hex" = String, Path, description = "ICAO 24-bit address")
    ),
    responses(
        (status = 200, description = "Closest airport to the aircraft", body = NearestAirportResponse),
        (status = 404, description = "Aircraft unknown or without a position", body = ErrorResponse)
    ),
    tag = "map"
)]
pub async fn nearest_airport(
    State(state): State<AppState>,
    Path(hex): Path<String>,
) -> ApiResult<Json<NearestAirportResponse>> {
    let hex = hex.to_lowercase();
    let fix = state
        .tracker
        .lock()?
        .last_position(&hex)
        .ok_or(ApiError::NotFound("aircraft_not_found"))?;

    let nearest =
        airports::nearest(fix.lat, fix.lon).ok_or(ApiError::NotFound("airport_not_found"))?;

    Ok(Json(NearestAirportResponse {
        hex_id: hex,
        nearest_airport: nearest,
    }))
}
