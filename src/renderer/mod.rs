mod board;
mod label;
mod live;
mod registry;
mod report;
mod surface;

pub use board::MarkerBoard;
pub use label::marker_label;
pub use live::{drive, BatchOutcome, LiveMarkerRenderer, MarkerSnapshot};
pub use report::{AircraftReport, Altitude, LatLon};
pub use surface::{LoggingSurface, MapSurface};
