//! Error types for spotlens-store.

use std::path::PathBuf;

use uuid::Uuid;

/// Result type for spotlens-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in spotlens-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Spot not found in database.
    #[error("Spot not found: {0}")]
    SpotNotFound(Uuid),

    /// Media not found in database.
    #[error("Media not found: {0}")]
    MediaNotFound(Uuid),

    /// A record with this id already exists.
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: Uuid },

    /// A pulled spot arrived without a backend identifier.
    #[error("Pulled spot {0} has no server id")]
    MissingServerId(Uuid),

    /// The database was written by a newer schema than this build knows.
    #[error("Unsupported schema version {found} (newest supported is {supported})")]
    UnsupportedSchema { found: i32, supported: i32 },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
