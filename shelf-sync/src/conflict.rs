//! Conflict detection.
//!
//! A conflict exists only when the vault copy is strictly newer than the
//! record **and** at least one tracked field differs. Tracked fields are
//! `is_read`, `is_favorite` and `notes`; a missing front-matter key never
//! counts as a divergence.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelf_core::types::{Field, Record, RecordId};
use shelf_vault::metadata::{keys, Metadata};

/// One field whose record and vault values disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Divergence {
    pub field: Field,
    pub record_value: String,
    pub vault_value: String,
}

/// A genuine divergence between a record and its vault document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub record_id: RecordId,
    /// Absolute path of the vault document.
    pub path: PathBuf,
    pub record_updated_at: DateTime<Utc>,
    pub file_modified_at: DateTime<Utc>,
    pub divergences: Vec<Divergence>,
}

impl Conflict {
    pub fn fields(&self) -> Vec<Field> {
        self.divergences.iter().map(|d| d.field).collect()
    }
}

/// Compare a record against the metadata and notes parsed from its document.
///
/// Returns `None` unless `file_modified_at > record.updated_at` and some
/// tracked field differs. Every differing field is reported, in the order
/// read, favorite, notes.
pub fn detect(
    record: &Record,
    metadata: &Metadata,
    notes: &str,
    path: &Path,
    file_modified_at: DateTime<Utc>,
) -> Option<Conflict> {
    if file_modified_at <= record.updated_at {
        return None;
    }

    let mut divergences = Vec::new();
    for (field, key, current) in [
        (Field::IsRead, keys::READ, record.is_read),
        (Field::IsFavorite, keys::FAVORITE, record.is_favorite),
    ] {
        if let Some(vault) = metadata.get_bool(key) {
            if vault != current {
                divergences.push(Divergence {
                    field,
                    record_value: current.to_string(),
                    vault_value: vault.to_string(),
                });
            }
        }
    }

    let vault_notes = notes.trim();
    if vault_notes != record.notes_text() {
        divergences.push(Divergence {
            field: Field::Notes,
            record_value: record.notes_text().to_string(),
            vault_value: vault_notes.to_string(),
        });
    }

    if divergences.is_empty() {
        return None;
    }
    Some(Conflict {
        record_id: record.id.clone(),
        path: path.to_path_buf(),
        record_updated_at: record.updated_at,
        file_modified_at,
        divergences,
    })
}
