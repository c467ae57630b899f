use axum::{extract::State, Json};

use crate::renderer::MarkerSnapshot;
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/api/markers",
    responses(
        (status = 200, description = "Markers currently on the server-side map", body = Vec<MarkerSnapshot>)
    ),
    tag = "map"
)]
pub async fn list_markers(State(state): State<AppState>) -> Json<Vec<MarkerSnapshot>> {
    let renderer = state.renderer.lock().await;
    Json(renderer.snapshot())
}
