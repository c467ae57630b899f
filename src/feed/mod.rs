mod config;
mod dump1090;
mod error;
mod replay;
mod runner;
mod snapshot;
mod source;

pub use config::{Dump1090Config, FeedConfig, ReplayConfig};
pub use dump1090::Dump1090Client;
pub use error::FeedError;
pub use replay::{JsonReplay, Progress};
pub use runner::FeedRunner;
pub use snapshot::{normalize, RawAircraft, Snapshot};
pub use source::FeedSource;
