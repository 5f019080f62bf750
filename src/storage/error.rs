use thiserror::Error;

use crate::domain::track::SongId;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("song {0} not found")]
    SongNotFound(SongId),

    #[error("filesystem error: {0}")]
    Fs(#[from] std::io::Error),

    #[error("preferences error: {0}")]
    Preferences(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
