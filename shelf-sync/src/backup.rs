//! Pre-sync backup: a timestamped JSON snapshot of every record.
//!
//! ```text
//! <vault_root>/.shelf-backups/backup-2024-05-01T08-30-00.123Z.json
//! ```
//!
//! Snapshots are write-only; nothing in the engine reads them back.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelf_core::types::Record;

use crate::error::{io_err, SyncError};

/// Directory below the vault root that holds snapshots.
pub const BACKUP_DIR: &str = ".shelf-backups";

/// On-disk snapshot payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupFile {
    pub created_at: DateTime<Utc>,
    pub record_count: usize,
    pub records: Vec<Record>,
}

/// `<vault_root>/.shelf-backups/`
pub fn backup_dir(vault_root: &Path) -> PathBuf {
    vault_root.join(BACKUP_DIR)
}

/// `<vault_root>/.shelf-backups/backup-<timestamp>.json`
pub fn backup_path(vault_root: &Path, at: DateTime<Utc>) -> PathBuf {
    backup_dir(vault_root).join(format!(
        "backup-{}.json",
        at.format("%Y-%m-%dT%H-%M-%S%.3fZ")
    ))
}

/// Serialize `records` to a fresh snapshot file. Writes `.tmp` then renames.
pub fn write_backup(
    vault_root: &Path,
    records: Vec<Record>,
    at: DateTime<Utc>,
) -> Result<PathBuf, SyncError> {
    let dir = backup_dir(vault_root);
    std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

    let path = backup_path(vault_root, at);
    let payload = BackupFile {
        created_at: at,
        record_count: records.len(),
        records,
    };
    let json = serde_json::to_string_pretty(&payload)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }
    tracing::info!("backup written: {} ({} records)", path.display(), payload.record_count);
    Ok(path)
}
