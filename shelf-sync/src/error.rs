//! Error types for shelf-sync.

use std::path::PathBuf;

use thiserror::Error;

use shelf_core::{ConfigError, StoreError};
use shelf_renderer::RenderError;
use shelf_vault::VaultError;

/// Errors that fail a whole sync call. Per-item problems are reported in
/// the pass reports instead.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    /// An error from the rendering engine.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("vault error: {0}")]
    Vault(#[from] VaultError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (backup, conflict queue).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse conflict queue {path}: {source}")]
    QueueParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The pre-sync backup could not be written; nothing was mutated.
    #[error("backup failed at {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: Box<SyncError>,
    },

    #[error("record '{0}' not found")]
    RecordNotFound(String),

    #[error("no queued conflict for record '{0}'")]
    ConflictNotFound(String),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
