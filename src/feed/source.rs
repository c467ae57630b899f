use super::config::FeedConfig;
use super::dump1090::Dump1090Client;
use super::error::FeedError;
use super::replay::{JsonReplay, Progress};
use super::snapshot::Snapshot;
use crate::tracking::DataSource;

pub enum FeedSource {
    Replay(JsonReplay),
    Dump1090(Dump1090Client),
}

impl FeedSource {
    pub fn from_config(config: &FeedConfig) -> Result<Self, FeedError> {
        let source = match config.source {
            DataSource::Replay => {
                FeedSource::Replay(JsonReplay::open(&config.replay.dir, config.replay.looping)?)
            }
            DataSource::Dump1090 => {
                let client = Dump1090Client::new(&config.dump1090.url, config.dump1090.timeout)?;
                log::info!("Polling dump1090 at {}", client.url());
                FeedSource::Dump1090(client)
            }
        };
        Ok(source)
    }

    /// `Ok(None)` means the replay has nothing more to give.
    pub async fn next_snapshot(&mut self) -> Result<Option<Snapshot>, FeedError> {
        match self {
            FeedSource::Replay(replay) => Ok(replay.read_next()),
            FeedSource::Dump1090(client) => client.fetch().await.map(Some),
        }
    }

    pub fn data_source(&self) -> DataSource {
        match self {
            FeedSource::Replay(_) => DataSource::Replay,
            FeedSource::Dump1090(_) => DataSource::Dump1090,
        }
    }

    pub fn progress(&self) -> Option<Progress> {
        match self {
            FeedSource::Replay(replay) => Some(replay.progress()),
            FeedSource::Dump1090(_) => None,
        }
    }

    /// Rewinds a replay. Returns false for live sources, which cannot be reset.
    pub fn reset(&mut self) -> bool {
        match self {
            FeedSource::Replay(replay) => {
                replay.reset();
                true
            }
            FeedSource::Dump1090(_) => false,
        }
    }
}
