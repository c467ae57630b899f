use axum::{extract::State, response::IntoResponse};

use crate::web::state::AppState;

use super::templates::MapTemplate;

pub async fn map(State(state): State<AppState>) -> impl IntoResponse {
    MapTemplate::from(&state.config.map)
}
