//! Atomic, hash-gated document writer.
//!
//! ## `write_document` protocol
//!
//! 1. Normalise line endings to LF.
//! 2. SHA-256 hash the content.
//! 3. Hash the document currently on disk (if any) → skip if identical.
//! 4. Ensure the parent directory exists.
//! 5. Write to `<path>.shelf.tmp`.
//! 6. Rename to the final path (atomic on POSIX); remove the tmp on failure.
//!
//! A skipped write leaves the file's mtime untouched, so an unchanged export
//! never looks like a vault-side edit to the next import pass.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{io_err, VaultError};
use crate::layout::ensure_dir;

/// Outcome of an individual document write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped: content matches what is already on disk.
    Unchanged { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path } | WriteResult::Unchanged { path } => path,
        }
    }

    pub fn was_written(&self) -> bool {
        matches!(self, WriteResult::Written { .. })
    }
}

/// Hex SHA-256 of LF-normalised `content`.
pub fn content_hash(content: &str) -> String {
    let normalized = content.replace("\r\n", "\n");
    let mut h = Sha256::new();
    h.update(normalized.as_bytes());
    hex::encode(h.finalize())
}

/// Sibling temp path used while writing `path`.
pub fn tmp_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.shelf.tmp", path.display()))
}

/// Atomically write `content` to `path` unless the file already holds it.
pub fn write_document(path: &Path, content: &str) -> Result<WriteResult, VaultError> {
    write_with_tmp(path, content, &tmp_path(path))
}

fn write_with_tmp(path: &Path, content: &str, tmp: &Path) -> Result<WriteResult, VaultError> {
    let normalized = content.replace("\r\n", "\n");
    let digest = content_hash(&normalized);

    if let Some(existing) = hash_on_disk(path) {
        if existing == digest {
            tracing::debug!("unchanged: {}", path.display());
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }
    }

    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    std::fs::write(tmp, &normalized).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

/// Hash of the file at `path`, or `None` when it cannot be read as text.
fn hash_on_disk(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok().map(|s| content_hash(&s))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn first_write_returns_written() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Note.md");
        let result = write_document(&path, "hello").unwrap();
        assert!(result.was_written());
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn second_write_same_content_returns_unchanged() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("file.md");
        write_document(&path, "same content").unwrap();
        let result = write_document(&path, "same content").unwrap();
        assert_eq!(result, WriteResult::Unchanged { path: path.clone() });
    }

    #[test]
    fn changed_content_returns_written() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("file.md");
        write_document(&path, "v1").unwrap();
        let result = write_document(&path, "v2").unwrap();
        assert!(result.was_written());
        assert_eq!(fs::read_to_string(&path).unwrap(), "v2");
    }

    #[test]
    fn unchanged_write_preserves_mtime() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("keep.md");
        write_document(&path, "stable").unwrap();
        let old = filetime::FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&path, old).unwrap();

        write_document(&path, "stable").unwrap();
        let after = filetime::FileTime::from_last_modification_time(&fs::metadata(&path).unwrap());
        assert_eq!(after, old);
    }

    #[test]
    fn tmp_file_removed_after_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clean.md");
        write_document(&path, "data").unwrap();
        assert!(!tmp_path(&path).exists(), ".shelf.tmp must be cleaned up");
    }

    #[test]
    fn creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Reading List").join("2024").join("05").join("a.md");
        write_document(&path, "content").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn crlf_and_lf_content_share_the_same_hash() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("normalize.md");

        let first = write_document(&path, "line1\r\nline2\r\n").unwrap();
        assert!(first.was_written());

        let second = write_document(&path, "line1\nline2\n").unwrap();
        assert!(matches!(second, WriteResult::Unchanged { .. }));

        assert_eq!(fs::read_to_string(&path).unwrap(), "line1\nline2\n");
    }

    #[test]
    fn rename_failure_leaves_target_and_cleans_tmp() {
        let root = TempDir::new().unwrap();
        // A non-empty directory where the document should go makes the rename fail.
        let path = root.path().join("occupied.md");
        fs::create_dir_all(path.join("child")).unwrap();

        let tmp_dir = TempDir::new().unwrap();
        let tmp = tmp_dir.path().join("occupied.md.shelf.tmp");

        let err = write_with_tmp(&path, "new content", &tmp).unwrap_err();
        assert!(matches!(err, VaultError::Io { .. }));
        assert!(path.join("child").is_dir(), "target must be intact");
        assert!(!tmp.exists(), ".shelf.tmp should be cleaned up");
    }

    #[test]
    fn parent_blocked_by_file_is_an_error() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("example.com"), "not a dir").unwrap();
        let err = write_document(&root.path().join("example.com/a.md"), "x").unwrap_err();
        assert!(matches!(err, VaultError::Io { .. }));
    }
}
