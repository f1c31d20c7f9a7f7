use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timestamp parse error: {0}")]
    Timestamp(#[from] chrono::ParseError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
