//! Error types for shelf-vault.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while touching the vault on disk.
#[derive(Debug, Error)]
pub enum VaultError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A computed path escaped the vault root.
    #[error("path {path} is outside the vault root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

/// Convenience constructor for [`VaultError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> VaultError {
    VaultError::Io {
        path: path.into(),
        source,
    }
}
