use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use super::api::error::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::feed::health,
        super::api::feed::stats,
        super::api::feed::reset,
        super::api::markers::list_markers,
        super::api::airports::list_airports,
        super::api::airports::nearest_airport,
        super::api::trails::get_trail,
    ),
    components(
        schemas(
            ErrorResponse,
            super::api::feed::HealthResponse,
            super::api::feed::StatsResponse,
            super::api::feed::ConfigSummary,
            super::api::feed::ResetResponse,
            super::api::airports::NearestAirportResponse,
            super::api::trails::TrailResponse,
            crate::renderer::MarkerSnapshot,
            crate::airports::FeatureCollection,
            crate::airports::NearestAirport,
            crate::tracking::FeedStats,
            crate::tracking::AircraftSummary,
            crate::tracking::DataSource,
            crate::feed::Progress,
            crate::storage::StoredPoint,
            crate::storage::TrailMetadata,
            crate::storage::TrailStatistics,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "skytrace API",
        description = "Live aircraft positions, feed control and stored trails",
        version = "0.1.0"
    ),
    tags(
        (name = "feed", description = "Feed status and control"),
        (name = "map", description = "Markers and airports"),
        (name = "trails", description = "Stored aircraft trails")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
