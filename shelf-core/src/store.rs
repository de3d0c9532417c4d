//! Record store interface and its JSON-file implementation.
//!
//! The sync engine only ever talks to [`RecordStore`]. [`JsonRecordStore`]
//! keeps every record in a single `records.json` document and rewrites it
//! atomically (`.tmp` + rename) after each mutation.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::shelf_dir_at;
use crate::error::{io_err, StoreError};
use crate::types::{Highlight, Record, RecordId, RecordPatch};

// ---------------------------------------------------------------------------
// Interface
// ---------------------------------------------------------------------------

/// CRUD surface the sync engine consumes.
pub trait RecordStore {
    /// Every record, in store order.
    fn fetch_all(&self) -> Result<Vec<Record>, StoreError>;

    fn fetch_by_id(&self, id: &RecordId) -> Result<Option<Record>, StoreError>;

    /// Records that must be (re-)exported to the vault.
    fn fetch_unsynced(&self) -> Result<Vec<Record>, StoreError>;

    /// Apply `patch` to the record with `id`. Returns the number of records
    /// matched: 1 for a known id even when nothing changed, 0 otherwise.
    fn update_fields(&mut self, id: &RecordId, patch: &RecordPatch) -> Result<usize, StoreError>;

    /// Highlights attached to a record.
    fn highlights(&self, id: &RecordId) -> Result<Vec<Highlight>, StoreError>;
}

// ---------------------------------------------------------------------------
// JSON implementation
// ---------------------------------------------------------------------------

/// On-disk payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    records: Vec<Record>,
    #[serde(default)]
    highlights: Vec<Highlight>,
}

/// `<home>/.shelf/records.json`
pub fn records_path_at(home: &Path) -> PathBuf {
    shelf_dir_at(home).join("records.json")
}

/// File-backed [`RecordStore`].
#[derive(Debug)]
pub struct JsonRecordStore {
    path: PathBuf,
    data: StoreFile,
}

impl JsonRecordStore {
    /// Open the store at `path`. A missing file is an empty store; it is
    /// created on the first mutation.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            serde_json::from_str(&contents).map_err(|e| StoreError::Parse {
                path: path.clone(),
                source: e,
            })?
        } else {
            StoreFile::default()
        };
        Ok(JsonRecordStore { path, data })
    }

    /// Open `<home>/.shelf/records.json`.
    pub fn open_at(home: &Path) -> Result<Self, StoreError> {
        Self::open(records_path_at(home))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.data.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.records.is_empty()
    }

    /// Add a new record. Fails with [`StoreError::Duplicate`] if the id exists.
    pub fn insert(&mut self, record: Record) -> Result<(), StoreError> {
        if self.data.records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::Duplicate(record.id.0));
        }
        self.data.records.push(record);
        self.save()
    }

    /// Delete a record and its highlights. Returns `true` if it existed.
    pub fn remove(&mut self, id: &RecordId) -> Result<bool, StoreError> {
        let before = self.data.records.len();
        self.data.records.retain(|r| &r.id != id);
        let removed = self.data.records.len() != before;
        if removed {
            self.data.highlights.retain(|h| &h.record_id != id);
            self.save()?;
        }
        Ok(removed)
    }

    pub fn add_highlight(&mut self, highlight: Highlight) -> Result<(), StoreError> {
        self.data.highlights.push(highlight);
        self.save()
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| io_err(&self.path, e))?;
        Ok(())
    }
}

impl RecordStore for JsonRecordStore {
    fn fetch_all(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self.data.records.clone())
    }

    fn fetch_by_id(&self, id: &RecordId) -> Result<Option<Record>, StoreError> {
        Ok(self.data.records.iter().find(|r| &r.id == id).cloned())
    }

    fn fetch_unsynced(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .data
            .records
            .iter()
            .filter(|r| r.needs_export())
            .cloned()
            .collect())
    }

    fn update_fields(&mut self, id: &RecordId, patch: &RecordPatch) -> Result<usize, StoreError> {
        let Some(record) = self.data.records.iter_mut().find(|r| &r.id == id) else {
            return Ok(0);
        };
        if record.apply(patch, Utc::now()) {
            self.save()?;
        }
        Ok(1)
    }

    fn highlights(&self, id: &RecordId) -> Result<Vec<Highlight>, StoreError> {
        Ok(self
            .data
            .highlights
            .iter()
            .filter(|h| &h.record_id == id)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
