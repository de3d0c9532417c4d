//! Persisted conflict queue.
//!
//! Queued conflicts outlive a single process so `shelf conflicts` and
//! `shelf resolve` can act on what the last sync found. The queue lives at
//! `<home>/.shelf/conflicts.json` and is written with the same atomic
//! `.tmp` + rename pattern as the rest of the state files.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelf_core::config::shelf_dir_at;

use crate::conflict::Conflict;
use crate::error::{io_err, SyncError};

/// On-disk queue payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueFile {
    pub saved_at: DateTime<Utc>,
    pub conflicts: Vec<Conflict>,
}

/// `<home>/.shelf/conflicts.json`
pub fn queue_path_at(home: &Path) -> PathBuf {
    shelf_dir_at(home).join("conflicts.json")
}

/// Load queued conflicts. A missing file is an empty queue.
pub fn load_at(home: &Path) -> Result<Vec<Conflict>, SyncError> {
    let path = queue_path_at(home);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let file: QueueFile = serde_json::from_str(&contents)
        .map_err(|e| SyncError::QueueParse { path, source: e })?;
    Ok(file.conflicts)
}

/// Save the queue atomically. Writes to `<path>.tmp` then renames.
pub fn save_at(home: &Path, conflicts: &[Conflict]) -> Result<(), SyncError> {
    let path = queue_path_at(home);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid conflict queue path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let payload = QueueFile {
        saved_at: Utc::now(),
        conflicts: conflicts.to_vec(),
    };
    let json = serde_json::to_string_pretty(&payload)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}
