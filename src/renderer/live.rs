use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, Mutex};
use utoipa::ToSchema;

use crate::push::PushEvent;

use super::board::MarkerBoard;
use super::label::marker_label;
use super::registry::MarkerRegistry;
use super::report::AircraftReport;
use super::surface::MapSurface;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub created: usize,
    pub moved: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MarkerSnapshot {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
}

/// Keeps one marker per aircraft identifier on a map surface.
pub struct LiveMarkerRenderer<S: MapSurface> {
    surface: S,
    registry: MarkerRegistry<S::Handle>,
}

impl<S: MapSurface> LiveMarkerRenderer<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            registry: MarkerRegistry::new(),
        }
    }

    pub fn handle_batch(&mut self, reports: &[AircraftReport]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for report in reports {
            let Some(position) = report.position() else {
                outcome.skipped += 1;
                continue;
            };

            let label = marker_label(report);
            if let Some(existing) = self.registry.get(&report.id) {
                self.surface.move_marker(existing, position);
                self.surface.bind_label(existing, &label);
                outcome.moved += 1;
            } else {
                let created = self.surface.add_marker(position);
                self.surface.bind_label(&created, &label);
                self.registry.register(&report.id, created);
                outcome.created += 1;
            }
        }

        outcome
    }

    /// Only `aircraft_data` batches touch the map.
    pub fn on_event(&mut self, event: &PushEvent) -> Option<BatchOutcome> {
        match event {
            PushEvent::AircraftData(reports) => Some(self.handle_batch(reports)),
            _ => None,
        }
    }

    pub fn marker_count(&self) -> usize {
        self.registry.len()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

impl LiveMarkerRenderer<MarkerBoard> {
    pub fn snapshot(&self) -> Vec<MarkerSnapshot> {
        let mut markers: Vec<MarkerSnapshot> = self
            .registry
            .iter()
            .filter_map(|(id, handle)| {
                self.surface.get(handle).map(|placed| MarkerSnapshot {
                    id: id.clone(),
                    latitude: placed.position.lat,
                    longitude: placed.position.lon,
                    label: placed.label.clone(),
                })
            })
            .collect();
        markers.sort_by(|a, b| a.id.cmp(&b.id));
        markers
    }
}

/// Feeds push events into a shared renderer until the channel closes.
pub async fn drive<S>(
    renderer: Arc<Mutex<LiveMarkerRenderer<S>>>,
    mut events: broadcast::Receiver<PushEvent>,
) where
    S: MapSurface,
{
    loop {
        match events.recv().await {
            Ok(event) => {
                let mut renderer = renderer.lock().await;
                if let Some(outcome) = renderer.on_event(&event) {
                    log::debug!(
                        "Batch rendered: {} new, {} moved, {} skipped ({} markers)",
                        outcome.created,
                        outcome.moved,
                        outcome.skipped,
                        renderer.marker_count()
                    );
                }
            }
            Err(RecvError::Lagged(missed)) => {
                log::warn!("Marker renderer lagged, {} events dropped", missed);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::{Pong, PushChannel};
    use crate::renderer::report::{Altitude, LatLon};
    use pretty_assertions::assert_eq;

    fn report(id: &str, lat: f64, lon: f64) -> AircraftReport {
        AircraftReport::new(id).at(lat, lon)
    }

    #[test]
    fn new_identifier_gets_marker_at_its_position() {
        let mut renderer = LiveMarkerRenderer::new(MarkerBoard::new());
        let outcome = renderer.handle_batch(&[report("4ba9c1", 41.26, 28.74)]);

        assert_eq!(
            outcome,
            BatchOutcome {
                created: 1,
                moved: 0,
                skipped: 0
            }
        );
        let snapshot = renderer.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].latitude, 41.26);
        assert_eq!(snapshot[0].longitude, 28.74);
    }

    #[test]
    fn repeated_identifier_moves_existing_marker() {
        let mut renderer = LiveMarkerRenderer::new(MarkerBoard::new());
        renderer.handle_batch(&[report("abc", 40.0, 29.0)]);
        let outcome = renderer.handle_batch(&[report("abc", 40.1, 29.1)]);

        assert_eq!(outcome.created, 0);
        assert_eq!(outcome.moved, 1);
        assert_eq!(renderer.marker_count(), 1);
        assert_eq!(renderer.surface().len(), 1);
        assert_eq!(
            renderer.snapshot()[0],
            MarkerSnapshot {
                id: "abc".into(),
                latitude: 40.1,
                longitude: 29.1,
                label: "HEX: abc".into(),
            }
        );
    }

    #[test]
    fn duplicate_identifier_within_batch_does_not_duplicate_marker() {
        let mut renderer = LiveMarkerRenderer::new(MarkerBoard::new());
        let outcome = renderer.handle_batch(&[report("abc", 1.0, 1.0), report("abc", 2.0, 2.0)]);

        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.moved, 1);
        assert_eq!(renderer.surface().len(), 1);
    }

    #[test]
    fn missing_coordinates_never_create_or_move() {
        let mut renderer = LiveMarkerRenderer::new(MarkerBoard::new());
        renderer.handle_batch(&[report("abc", 10.0, 20.0)]);

        let mut no_lat = AircraftReport::new("abc");
        no_lat.longitude = Some(50.0);
        let mut no_lon = AircraftReport::new("new");
        no_lon.latitude = Some(50.0);
        let outcome = renderer.handle_batch(&[no_lat, no_lon]);

        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.created + outcome.moved, 0);
        assert_eq!(renderer.marker_count(), 1);
        let snapshot = renderer.snapshot();
        assert_eq!(
            (snapshot[0].latitude, snapshot[0].longitude),
            (10.0, 20.0)
        );
    }

    #[test]
    fn label_follows_latest_report() {
        let mut renderer = LiveMarkerRenderer::new(MarkerBoard::new());
        let mut first = report("abc", 1.0, 1.0);
        first.altitude = Some(Altitude::Feet(12000.0));
        first.ground_speed = Some(280.0);
        renderer.handle_batch(&[first]);
        assert_eq!(
            renderer.snapshot()[0].label,
            "HEX: abc<br>Alt: 12000 ft<br>Speed: 280 kt"
        );

        renderer.handle_batch(&[report("abc", 1.1, 1.1)]);
        assert_eq!(renderer.snapshot()[0].label, "HEX: abc");
    }

    #[test]
    fn ignores_events_other_than_aircraft_data() {
        let mut renderer = LiveMarkerRenderer::new(MarkerBoard::new());
        let outcome = renderer.on_event(&PushEvent::Pong(Pong { timestamp: 0.0 }));
        assert!(outcome.is_none());
        assert_eq!(renderer.marker_count(), 0);
    }

    #[tokio::test]
    async fn drive_renders_batches_until_channel_closes() {
        let channel = PushChannel::new();
        let renderer = Arc::new(Mutex::new(LiveMarkerRenderer::new(MarkerBoard::new())));
        let task = tokio::spawn(drive(renderer.clone(), channel.subscribe()));

        channel.send(PushEvent::AircraftData(vec![
            report("a", 1.0, 1.0),
            report("b", 2.0, 2.0),
        ]));
        channel.send(PushEvent::AircraftData(vec![report("a", 1.5, 1.5)]));
        drop(channel);
        task.await.unwrap();

        let renderer = renderer.lock().await;
        assert_eq!(renderer.marker_count(), 2);
        let a = renderer.surface().get(renderer.registry.get("a").unwrap()).unwrap();
        assert_eq!(a.position, LatLon::new(1.5, 1.5));
    }

    #[tokio::test]
    async fn awaiting_drive_applies_every_queued_batch() {
        let channel = PushChannel::new();
        let renderer = Arc::new(Mutex::new(LiveMarkerRenderer::new(MarkerBoard::new())));
        let task = tokio::spawn(drive(renderer.clone(), channel.subscribe()));

        for n in 0..200 {
            let id = format!("{:06x}", n);
            channel.send(PushEvent::AircraftData(vec![report(&id, 40.0, 30.0 + n as f64 / 1000.0)]));
        }
        drop(channel);
        task.await.unwrap();

        let renderer = renderer.lock().await;
        assert_eq!(renderer.marker_count(), 200);
        assert_eq!(renderer.surface().len(), 200);
        assert!(!renderer.surface().is_empty());
    }
}
