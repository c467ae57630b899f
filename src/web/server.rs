use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::feed::{FeedError, FeedRunner, FeedSource};
use crate::push::PushChannel;
use crate::renderer::{drive, LiveMarkerRenderer, MarkerBoard};
use crate::storage::{spawn_cleanup, TrailError, TrailStore};
use crate::tracking::Tracker;

use super::api::{airports, feed, markers, trails};
use super::api_doc::ApiDoc;
use super::state::AppState;
use super::config::Config;
use super::ui::handlers as ui_handlers;
use super::ws::ws_handler;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("trail storage error: {0}")]
    Storage(#[from] TrailError),
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // UI routes
        .route("/", get(ui_handlers::map))
        .route("/ws", get(ws_handler))
        // Feed API endpoints
        .route("/api/health", get(feed::health))
        .route("/api/stats", get(feed::stats))
        .route("/api/control/reset", post(feed::reset))
        // Map API endpoints
        .route("/api/markers", get(markers::list_markers))
        .route("/api/airports", get(airports::list_airports))
        .route(
            "/api/nearest-airport/{hex}",
            get(airports::nearest_airport),
        )
        .route("/api/trail/{hex}", get(trails::get_trail))
        // Static files
        .nest_service("/static", ServeDir::new("static"))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Opens the trail store when enabled and wires it into a fresh tracker.
pub fn build_tracker(
    config: &Config,
    data_source: crate::tracking::DataSource,
) -> Result<(Tracker, Option<Arc<TrailStore>>), TrailError> {
    let tracker = Tracker::new(config.validation, config.region, config.trail, data_source);

    if !config.storage.enabled {
        return Ok((tracker, None));
    }

    let store = Arc::new(TrailStore::open(&config.storage.path)?);
    log::info!("Trail storage at {}", config.storage.path.display());
    Ok((tracker.with_trail_store(store.clone()), Some(store)))
}

pub async fn run_server(config: Config) -> Result<(), ServerError> {
    let bind_addr = config.web.bind.clone();

    let source = FeedSource::from_config(&config.feed)?;
    let (tracker, trail_store) = build_tracker(&config, source.data_source())?;
    log::info!("Feed source: {}", source.data_source());

    let channel = PushChannel::new();
    let renderer = Arc::new(Mutex::new(LiveMarkerRenderer::new(MarkerBoard::new())));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let state = AppState {
        config: Arc::new(config.clone()),
        tracker: Arc::new(std::sync::Mutex::new(tracker)),
        feed: Arc::new(Mutex::new(source)),
        renderer: renderer.clone(),
        channel: channel.clone(),
        trails: trail_store.clone(),
        shutdown: shutdown_rx,
    };

    let render_task = tokio::spawn(drive(renderer, channel.subscribe()));
    let cleanup_task = trail_store.map(|store| {
        spawn_cleanup(
            store,
            config.storage.retention,
            config.storage.cleanup_interval,
        )
    });
    let feed_task = tokio::spawn(
        FeedRunner::new(
            state.feed.clone(),
            state.tracker.clone(),
            channel,
            config.feed.clone(),
        )
        .run(),
    );

    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        log::error!("Failed to listen for Ctrl-C: {}", e);
                    }
                    log::info!("Shutdown requested");
                }
                result = feed_task => {
                    if let Err(e) = result {
                        log::error!("Feed task failed: {}", e);
                    }
                    log::info!("Feed finished, shutting down");
                }
            }
            let _ = shutdown_tx.send(true);
        })
        .await?;

    render_task.abort();
    if let Some(task) = cleanup_task {
        task.abort();
    }

    log::info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{Dump1090Client, JsonReplay};
    use crate::renderer::AircraftReport;
    use crate::tracking::{AircraftRecord, DataSource};
    use crate::push::PushEvent;
    use crate::web::config::{ApiKey, Permission};
    use crate::web::ws::{client_reply, initial_data};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::collections::HashSet;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct Harness {
        state: AppState,
        _shutdown: watch::Sender<bool>,
        _dir: TempDir,
    }

    fn harness(data_source: DataSource, with_storage: bool) -> Harness {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.api_keys.push(ApiKey {
            key: "ops-key".to_string(),
            name: "ops".to_string(),
            permissions: HashSet::from([Permission::ControlFeed]),
        });
        config.api_keys.push(ApiKey {
            key: "viewer-key".to_string(),
            name: "viewer".to_string(),
            permissions: HashSet::new(),
        });

        let source = match data_source {
            DataSource::Replay => FeedSource::Replay(JsonReplay::open(dir.path(), false).unwrap()),
            DataSource::Dump1090 => FeedSource::Dump1090(
                Dump1090Client::new("http://127.0.0.1:9/aircraft.json", Duration::from_secs(1))
                    .unwrap(),
            ),
        };

        let mut tracker = Tracker::new(
            config.validation,
            config.region,
            config.trail,
            data_source,
        );
        let trails = if with_storage {
            let store = Arc::new(TrailStore::open_in_memory().unwrap());
            tracker = tracker.with_trail_store(store.clone());
            Some(store)
        } else {
            None
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = AppState {
            config: Arc::new(config),
            tracker: Arc::new(std::sync::Mutex::new(tracker)),
            feed: Arc::new(Mutex::new(source)),
            renderer: Arc::new(Mutex::new(LiveMarkerRenderer::new(MarkerBoard::new()))),
            channel: PushChannel::new(),
            trails,
            shutdown: shutdown_rx,
        };

        Harness {
            state,
            _shutdown: shutdown_tx,
            _dir: dir,
        }
    }

    fn record(hex: &str, lat: f64, lon: f64) -> AircraftRecord {
        AircraftRecord {
            hex: hex.to_string(),
            flight: "THY7".to_string(),
            altitude: None,
            speed: Some(420.0),
            track: Some(90.0),
            lat,
            lon,
            seen: 0.0,
            seen_pos: None,
            squawk: None,
            registration: None,
            aircraft_type: None,
        }
    }

    async fn request(state: &AppState, req: Request<Body>) -> (StatusCode, Value) {
        let response = router(state.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn reset_request(key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/api/control/reset");
        if let Some(key) = key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_reports_source_and_counts() {
        let h = harness(DataSource::Replay, false);
        let (status, body) = request(&h.state, get("/api/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["active_aircraft"], 0);
        assert_eq!(body["data_source"], "replay");
    }

    #[tokio::test]
    async fn markers_reflect_rendered_batches() {
        let h = harness(DataSource::Replay, false);
        h.state.renderer.lock().await.handle_batch(&[
            AircraftReport::new("b2").at(40.0, 29.0),
            AircraftReport::new("a1").at(41.0, 28.0),
            AircraftReport::new("nopos"),
        ]);

        let (status, body) = request(&h.state, get("/api/markers")).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["a1", "b2"]);
        assert_eq!(body[0]["label"], "HEX: a1");
    }

    #[tokio::test]
    async fn reset_requires_control_permission() {
        let h = harness(DataSource::Replay, false);

        let (status, body) = request(&h.state, reset_request(None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing_api_key");

        let (status, body) = request(&h.state, reset_request(Some("wrong"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_api_key");

        let (status, body) = request(&h.state, reset_request(Some("viewer-key"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "missing_permission");
        assert_eq!(body["message"], "API key lacks the control_feed permission");

        let (status, body) = request(&h.state, reset_request(Some("ops-key"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["progress"]["current"], 0);
    }

    #[tokio::test]
    async fn reset_is_a_conflict_for_live_sources() {
        let h = harness(DataSource::Dump1090, false);
        let (status, body) = request(&h.state, reset_request(Some("ops-key"))).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "live_source");
    }

    #[tokio::test]
    async fn trail_is_unavailable_without_storage() {
        let h = harness(DataSource::Replay, false);
        let (status, body) = request(&h.state, get("/api/trail/abc123")).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "storage_disabled");
    }

    #[tokio::test]
    async fn trail_returns_stored_points() {
        let h = harness(DataSource::Replay, true);
        {
            let mut tracker = h.state.tracker.lock().unwrap();
            tracker.process(1000.0, vec![record("abc123", 40.0, 29.0)]);
            tracker.process(1010.0, vec![record("abc123", 40.01, 29.0)]);
        }

        let (status, body) = request(&h.state, get("/api/trail/ABC123")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hex_id"], "ABC123");
        // the first fix has no trail yet and is not stored
        assert_eq!(body["trail"].as_array().unwrap().len(), 1);
        assert_eq!(body["trail"][0]["lat"], 40.01);
        assert_eq!(body["metadata"]["point_count"], 1);

        let (status, body) = request(&h.state, get("/api/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"]["total_points"], 1);
        assert_eq!(body["aircraft"]["abc123"]["position_count"], 2);
    }

    #[tokio::test]
    async fn nearest_airport_needs_a_known_aircraft() {
        let h = harness(DataSource::Replay, false);

        let (status, body) = request(&h.state, get("/api/nearest-airport/zzz")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "aircraft_not_found");

        h.state
            .tracker
            .lock()
            .unwrap()
            .process(1000.0, vec![record("abc123", 41.25, 28.75)]);
        let (status, body) = request(&h.state, get("/api/nearest-airport/abc123")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nearest_airport"]["icao"], "LTFM");
    }

    #[tokio::test]
    async fn airports_and_map_page_are_served() {
        let h = harness(DataSource::Replay, false);

        let (status, body) = request(&h.state, get("/api/airports")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "FeatureCollection");

        let response = router(h.state.clone()).oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("center: [39.9, 32.8]"));
    }

    #[tokio::test]
    async fn initial_data_carries_rendered_markers_and_stats() {
        let h = harness(DataSource::Replay, false);
        h.state
            .tracker
            .lock()
            .unwrap()
            .process(1000.0, vec![record("abc123", 41.0, 29.0)]);
        h.state
            .renderer
            .lock()
            .await
            .handle_batch(&[AircraftReport::new("abc123").at(41.0, 29.0)]);

        let event = initial_data(&h.state).await.unwrap();
        let frame = serde_json::to_value(&event).unwrap();
        assert_eq!(frame["event"], "initial_data");
        assert_eq!(frame["data"]["connected"], true);
        assert_eq!(frame["data"]["stats"]["active_aircraft"], 1);
        assert_eq!(frame["data"]["markers"][0]["id"], "abc123");
        assert_eq!(frame["data"]["markers"][0]["latitude"], 41.0);
        assert_eq!(frame["data"]["markers"][0]["label"], "HEX: abc123");
    }

    #[tokio::test]
    async fn initial_data_is_empty_before_any_batch() {
        let h = harness(DataSource::Replay, false);
        match initial_data(&h.state).await {
            Some(PushEvent::InitialData(initial)) => {
                assert!(initial.connected);
                assert!(initial.markers.is_empty());
                assert_eq!(initial.stats.active_aircraft, 0);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn ping_is_answered_with_pong() {
        let reply = client_reply(r#"{"event":"ping"}"#).unwrap();
        let frame = serde_json::to_value(&reply).unwrap();
        assert_eq!(frame["event"], "pong");
        assert!(frame["data"]["timestamp"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn unknown_client_frames_get_no_reply() {
        assert!(client_reply("not json").is_none());
        assert!(client_reply(r#"{"event":"subscribe"}"#).is_none());
        assert!(client_reply(r#"{"event":"aircraft_data","data":[]}"#).is_none());
    }

    #[tokio::test]
    async fn connected_clients_receive_broadcast_batches() {
        let h = harness(DataSource::Replay, false);
        let _client = h.state.channel.connect();
        let mut events = h.state.channel.subscribe();

        h.state
            .channel
            .send(PushEvent::AircraftData(vec![AircraftReport::new("abc123").at(41.0, 29.0)]));

        let frame = serde_json::to_value(events.recv().await.unwrap()).unwrap();
        assert_eq!(frame["event"], "aircraft_data");
        assert_eq!(frame["data"][0]["id"], "abc123");

        let (_, body) = request(&h.state, get("/api/health")).await;
        assert_eq!(body["connected_clients"], 1);
    }

    #[tokio::test]
    async fn browser_script_renders_text_and_does_not_reconnect() {
        let h = harness(DataSource::Replay, false);
        let response = router(h.state.clone())
            .oneshot(get("/static/map.js"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let script = String::from_utf8(bytes.to_vec()).unwrap();

        assert!(script.contains("createTextNode"));
        assert!(!script.contains(".join(\"<br>\")"));
        assert!(!script.contains("setTimeout(connect"));
    }
}
