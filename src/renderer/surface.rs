use std::fmt;

use super::report::LatLon;

/// Something markers can be drawn on.
pub trait MapSurface {
    type Handle;

    fn add_marker(&mut self, position: LatLon) -> Self::Handle;
    fn move_marker(&mut self, marker: &Self::Handle, position: LatLon);
    fn bind_label(&mut self, marker: &Self::Handle, label: &str);
}

/// Logs every mutation before forwarding it to the wrapped surface.
pub struct LoggingSurface<S> {
    inner: S,
}

impl<S> LoggingSurface<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S> MapSurface for LoggingSurface<S>
where
    S: MapSurface,
    S::Handle: fmt::Debug,
{
    type Handle = S::Handle;

    fn add_marker(&mut self, position: LatLon) -> Self::Handle {
        let handle = self.inner.add_marker(position);
        log::info!(
            "Placed marker {:?} at {:.5}, {:.5}",
            handle,
            position.lat,
            position.lon
        );
        handle
    }

    fn move_marker(&mut self, marker: &Self::Handle, position: LatLon) {
        log::debug!(
            "Moving marker {:?} to {:.5}, {:.5}",
            marker,
            position.lat,
            position.lon
        );
        self.inner.move_marker(marker, position);
    }

    fn bind_label(&mut self, marker: &Self::Handle, label: &str) {
        log::trace!("Label for marker {:?}: {}", marker, label);
        self.inner.bind_label(marker, label);
    }
}
