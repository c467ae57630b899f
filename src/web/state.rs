use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use crate::feed::FeedSource;
use crate::push::PushChannel;
use crate::renderer::{LiveMarkerRenderer, MarkerBoard};
use crate::storage::TrailStore;
use crate::tracking::Tracker;

use super::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tracker: Arc<std::sync::Mutex<Tracker>>,
    pub feed: Arc<Mutex<FeedSource>>,
    pub renderer: Arc<Mutex<LiveMarkerRenderer<MarkerBoard>>>,
    pub channel: PushChannel,
    /// `None` when trail storage is disabled.
    pub trails: Option<Arc<TrailStore>>,
    /// Flips to `true` when the server begins shutting down.
    pub shutdown: watch::Receiver<bool>,
}
