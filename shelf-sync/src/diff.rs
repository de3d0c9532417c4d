//! Dry-run unified diff support for `shelf diff`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use shelf_core::types::{Record, SyncConfig};
use shelf_renderer::Renderer;

use crate::error::{io_err, SyncError};
use crate::export::target_path;

/// What exporting one record would change in the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDiff {
    /// Absolute path of the target document.
    pub path: PathBuf,
    /// Empty when the document already matches the rendered record.
    pub unified_diff: String,
}

impl RecordDiff {
    pub fn is_empty(&self) -> bool {
        self.unified_diff.is_empty()
    }
}

/// Render `record` and compare it to the current document. No files are
/// written.
pub fn diff_record(
    record: &Record,
    config: &SyncConfig,
    renderer: &Renderer,
) -> Result<RecordDiff, SyncError> {
    let path = target_path(record, config)?;
    let rendered = normalize_line_endings(&renderer.render(record, config.template)?);
    let existing = read_existing_or_empty(&path)?;
    if existing == rendered {
        return Ok(RecordDiff {
            path,
            unified_diff: String::new(),
        });
    }

    let relative = path.strip_prefix(&config.vault_root).unwrap_or(path.as_path());
    let old_header = format!("a/{}", relative.display());
    let new_header = format!("b/{}", relative.display());
    let unified = TextDiff::from_lines(&existing, &rendered)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();

    Ok(RecordDiff {
        path,
        unified_diff: unified,
    })
}

fn read_existing_or_empty(path: &Path) -> Result<String, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(normalize_line_endings(&content)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(io_err(path, err)),
    }
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}
