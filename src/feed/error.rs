use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("replay directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid snapshot in {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("tracker lock poisoned")]
    Poisoned,
}
