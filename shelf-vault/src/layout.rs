//! Naming and layout policy: where a record's document lives in the vault.

use std::path::{Component, Path, PathBuf};

use shelf_core::types::{LayoutMode, Record, SyncConfig};

use crate::error::{io_err, VaultError};
use crate::scanner::DOCUMENT_EXTENSION;

/// Longest file stem, counted in characters.
pub const MAX_STEM_CHARS: usize = 100;

const FALLBACK_STEM: &str = "untitled";
const ILLEGAL: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Sanitized `<title>.md` file name.
pub fn file_name(title: &str) -> String {
    format!("{}.{DOCUMENT_EXTENSION}", file_stem(title))
}

fn file_stem(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !ILLEGAL.contains(c) && !c.is_control())
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(MAX_STEM_CHARS).collect();
    let stem = truncated.trim_end();
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        FALLBACK_STEM.to_string()
    } else {
        stem.to_string()
    }
}

/// `<title> (<id>).md`, used when the plain name is taken by another record.
pub fn disambiguated_file_name(title: &str, record: &Record) -> String {
    let id = file_stem(&record.id.0);
    format!("{} ({id}).{DOCUMENT_EXTENSION}", file_stem(title))
}

/// Absolute folder a record's document belongs in.
///
/// - `by-date`   → `<sync_root>/YYYY/MM`
/// - `by-domain` → `<sync_root>/<domain>` (no segment without a domain)
/// - `flat`      → `<sync_root>`
pub fn folder_path(record: &Record, config: &SyncConfig) -> PathBuf {
    let base = config.sync_root();
    match config.layout {
        LayoutMode::ByDate => base
            .join(record.created_at.format("%Y").to_string())
            .join(record.created_at.format("%m").to_string()),
        LayoutMode::ByDomain => match record.domain.as_deref().map(str::trim) {
            Some(domain) if !domain.is_empty() => base.join(domain),
            _ => base,
        },
        LayoutMode::Flat => base,
    }
}

/// Default absolute target path for a record.
pub fn document_path(record: &Record, config: &SyncConfig) -> PathBuf {
    folder_path(record, config).join(file_name(&record.title))
}

/// Create `dir` and its parents. A no-op when it already exists.
pub fn ensure_dir(dir: &Path) -> Result<(), VaultError> {
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))
}

/// `path` relative to `root`, for storage on the record.
pub fn relative_to(root: &Path, path: &Path) -> Result<PathBuf, VaultError> {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .map_err(|_| VaultError::OutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })
}

/// Join a stored relative path back onto `root`, refusing anything that
/// would climb out of it.
pub fn resolve_in(root: &Path, relative: &Path) -> Result<PathBuf, VaultError> {
    let escapes = relative.components().any(|c| {
        matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
    });
    if escapes {
        return Err(VaultError::OutsideRoot {
            path: relative.to_path_buf(),
            root: root.to_path_buf(),
        });
    }
    Ok(root.join(relative))
}
