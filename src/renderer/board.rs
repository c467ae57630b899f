use serde::Serialize;
use utoipa::ToSchema;

use super::report::LatLon;
use super::surface::MapSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(usize);

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PlacedMarker {
    pub position: LatLon,
    pub label: String,
}

/// In-memory map scene. Markers are only ever appended.
#[derive(Debug, Default)]
pub struct MarkerBoard {
    markers: Vec<PlacedMarker>,
}

impl MarkerBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, marker: &MarkerId) -> Option<&PlacedMarker> {
        self.markers.get(marker.0)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl MapSurface for MarkerBoard {
    type Handle = MarkerId;

    fn add_marker(&mut self, position: LatLon) -> MarkerId {
        self.markers.push(PlacedMarker {
            position,
            label: String::new(),
        });
        MarkerId(self.markers.len() - 1)
    }

    fn move_marker(&mut self, marker: &MarkerId, position: LatLon) {
        if let Some(placed) = self.markers.get_mut(marker.0) {
            placed.position = position;
        }
    }

    fn bind_label(&mut self, marker: &MarkerId, label: &str) {
        if let Some(placed) = self.markers.get_mut(marker.0) {
            placed.label = label.to_string();
        }
    }
}
