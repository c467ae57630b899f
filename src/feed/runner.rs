use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use super::config::FeedConfig;
use super::error::FeedError;
use super::source::FeedSource;
use crate::push::{PushChannel, PushEvent};
use crate::tracking::{DataSource, Tracker};

const IDLE_WAIT: Duration = Duration::from_secs(1);

enum Step {
    Published(usize),
    Exhausted,
}

/// Pulls snapshots from the active source, validates them and broadcasts
/// the resulting reports.
pub struct FeedRunner {
    source: Arc<tokio::sync::Mutex<FeedSource>>,
    tracker: Arc<Mutex<Tracker>>,
    channel: PushChannel,
    config: FeedConfig,
}

impl FeedRunner {
    pub fn new(
        source: Arc<tokio::sync::Mutex<FeedSource>>,
        tracker: Arc<Mutex<Tracker>>,
        channel: PushChannel,
        config: FeedConfig,
    ) -> Self {
        Self {
            source,
            tracker,
            channel,
            config,
        }
    }

    /// Runs until a non-looping replay is exhausted with `exit_when_done`
    /// set. A live source never returns.
    pub async fn run(self) {
        let mut consecutive_errors = 0u32;

        loop {
            match self.step().await {
                Ok(Step::Published(count)) => {
                    consecutive_errors = 0;
                    log::trace!("Published {} reports", count);
                    sleep(self.pace()).await;
                }
                Ok(Step::Exhausted) => {
                    if self.config.replay.exit_when_done {
                        log::info!("Replay finished");
                        return;
                    }
                    sleep(IDLE_WAIT).await;
                }
                Err(e) => {
                    consecutive_errors += 1;
                    log::error!("Feed error ({} in a row): {}", consecutive_errors, e);

                    if consecutive_errors >= self.config.dump1090.max_consecutive_errors {
                        log::warn!(
                            "Too many feed errors, backing off for {}",
                            humantime::format_duration(self.config.dump1090.backoff)
                        );
                        sleep(self.config.dump1090.backoff).await;
                        consecutive_errors = 0;
                    } else {
                        sleep(self.pace()).await;
                    }
                }
            }
        }
    }

    async fn step(&self) -> Result<Step, FeedError> {
        let (snapshot, progress) = {
            let mut source = self.source.lock().await;
            match source.next_snapshot().await? {
                Some(snapshot) => (snapshot, source.progress()),
                None => return Ok(Step::Exhausted),
            }
        };

        let now = snapshot.time_or(Utc::now().timestamp_millis() as f64 / 1000.0);
        let (reports, stats) = {
            let mut tracker = self.tracker.lock().map_err(|_| FeedError::Poisoned)?;
            tracker.set_progress(progress);
            let reports = tracker.process(now, snapshot.records());
            (reports, tracker.stats())
        };

        let count = reports.len();
        if count > 0 {
            let receivers = self.channel.send(PushEvent::AircraftData(reports));
            log::debug!("Sent {} aircraft to {} receivers", count, receivers);
            self.channel.send(PushEvent::Stats(stats));
        }

        Ok(Step::Published(count))
    }

    fn pace(&self) -> Duration {
        match self.config.source {
            DataSource::Replay => self.config.replay.pace(),
            DataSource::Dump1090 => self.config.dump1090.poll_interval,
        }
    }
}
