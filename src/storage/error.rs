use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrailError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("trail store lock poisoned")]
    Poisoned,
}
