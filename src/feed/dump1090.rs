use std::time::Duration;

use super::error::FeedError;
use super::snapshot::Snapshot;

/// Polls a running dump1090 for its current `aircraft.json`.
pub struct Dump1090Client {
    client: reqwest::Client,
    url: String,
}

impl Dump1090Client {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub async fn fetch(&self) -> Result<Snapshot, FeedError> {
        let snapshot = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json::<Snapshot>()
            .await?;
        Ok(snapshot)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
