mod config;
pub mod geo;
mod tracker;
mod types;
mod validator;

pub use config::{RegionConfig, TrailConfig, ValidationConfig};
pub use tracker::{AircraftSummary, LastPosition, Tracker};
pub use types::{AircraftRecord, DataSource, FeedStats};
pub use validator::{Assessment, Fix, PositionValidator, Verdict};
