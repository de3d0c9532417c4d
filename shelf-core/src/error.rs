//! Error types for shelf-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading, validating, or saving the sync configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.shelf/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// No config file at the expected path.
    #[error("config not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// The vault root is empty; every sync operation needs it.
    #[error("vault root is not configured")]
    MissingVaultRoot,

    #[error("unknown sync direction '{0}'; expected: export-only, import-only, both")]
    UnknownDirection(String),

    #[error("unknown folder layout '{0}'; expected: by-date, by-domain, flat")]
    UnknownLayout(String),

    #[error("unknown template '{0}'; expected: default, minimal, detailed")]
    UnknownTemplate(String),
}

/// Errors from the file-backed record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O failure with the offending path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (write path).
    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The store file exists but is not valid JSON for the expected shape.
    #[error("failed to parse record store at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Insert with an identifier that is already taken.
    #[error("record '{0}' already exists")]
    Duplicate(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
