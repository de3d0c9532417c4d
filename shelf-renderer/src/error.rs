//! Error types for shelf-renderer.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Tera(#[from] tera::Error),

    /// Building the Tera context from a record failed.
    #[error("cannot serialize template context: {0}")]
    Context(#[from] serde_json::Error),

    /// Reading the user template directory failed.
    #[error("cannot read template {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    /// Output without the leading front-matter block would be treated as
    /// foreign content on the next import.
    #[error("template {template} does not start with the front-matter block")]
    MissingFrontMatter { template: String },
}
