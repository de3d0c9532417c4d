//! Vault scanner.
//!
//! Walks a directory tree and loads every `.md` document with its text and
//! modification time. Scanning never fails: a missing root yields nothing and
//! unreadable entries are logged and skipped.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use walkdir::WalkDir;

/// Extension (without the dot) of documents the scanner picks up.
pub const DOCUMENT_EXTENSION: &str = "md";

/// One document found in the vault. Rebuilt on every scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultDocument {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Path relative to the scanned root.
    pub relative_path: PathBuf,
    pub content: String,
    pub modified_at: DateTime<Utc>,
}

/// Recursively load every document below `root`, sorted by relative path.
pub fn scan(root: &Path) -> Vec<VaultDocument> {
    if !root.is_dir() {
        tracing::debug!("scan root {} does not exist", root.display());
        return Vec::new();
    }

    let mut docs = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let at = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| root.display().to_string());
                tracing::warn!("skipping unreadable vault entry {at}: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_document(entry.path()) {
            continue;
        }
        match load(root, entry.path()) {
            Ok(doc) => docs.push(doc),
            Err(err) => {
                tracing::warn!("skipping unreadable document {}: {err}", entry.path().display());
            }
        }
    }
    docs.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    docs
}

/// Load a single document. The caller supplies the root its relative path
/// is computed against.
pub fn load(root: &Path, path: &Path) -> std::io::Result<VaultDocument> {
    let content = std::fs::read_to_string(path)?;
    let modified = std::fs::metadata(path)?.modified()?;
    let relative_path = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    Ok(VaultDocument {
        path: path.to_path_buf(),
        relative_path,
        content,
        modified_at: DateTime::<Utc>::from(modified),
    })
}

fn is_document(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(DOCUMENT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_root_yields_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(scan(&tmp.path().join("nope")).is_empty());
    }

    #[test]
    fn finds_nested_markdown_only() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("2024/05")).unwrap();
        fs::write(root.join("2024/05/b.md"), "b").unwrap();
        fs::write(root.join("a.md"), "a").unwrap();
        fs::write(root.join("notes.txt"), "skip").unwrap();
        fs::write(root.join("2024/image.png"), [0u8, 1, 2]).unwrap();

        let docs = scan(root);
        let rel: Vec<PathBuf> = docs.iter().map(|d| d.relative_path.clone()).collect();
        assert_eq!(rel, vec![PathBuf::from("2024/05/b.md"), PathBuf::from("a.md")]);
        assert_eq!(docs[0].content, "b");
        assert_eq!(docs[0].path, root.join("2024/05/b.md"));
    }

    #[test]
    fn non_utf8_document_is_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bad.md"), [0xffu8, 0xfe, 0x00]).unwrap();
        fs::write(tmp.path().join("good.md"), "ok").unwrap();
        let docs = scan(tmp.path());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].relative_path, PathBuf::from("good.md"));
    }

    #[test]
    fn modified_time_comes_from_filesystem() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("t.md");
        fs::write(&path, "x").unwrap();
        let when = filetime::FileTime::from_unix_time(1_700_000_000, 0);
        filetime::set_file_mtime(&path, when).unwrap();
        let docs = scan(tmp.path());
        assert_eq!(docs[0].modified_at.timestamp(), 1_700_000_000);
    }
}
