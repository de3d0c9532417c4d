//! Conflict resolution.
//!
//! | Policy        | Record side                         | Vault side                  |
//! |---------------|-------------------------------------|-----------------------------|
//! | `vault-wins`  | takes the document's values         | untouched                   |
//! | `record-wins` | `vault_synced_at` refreshed         | re-rendered from the record |
//! | `merge`       | booleans OR-ed, notes concatenated  | re-rendered from the merge  |
//! | `manual`      | untouched                           | untouched                   |
//!
//! Resolution never returns an error: every problem becomes a
//! [`ResolutionOutcome::Failed`] with a human-readable reason.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use shelf_core::types::{ConflictPolicy, Field, Record, RecordId, RecordPatch, SyncConfig};
use shelf_core::RecordStore;
use shelf_renderer::Renderer;
use shelf_vault::metadata::keys;
use shelf_vault::{classify, ManagedDocument, Parsed};

use crate::conflict::Conflict;
use crate::export::write_record;

pub const MANUAL_REQUIRED: &str = "manual resolution required";
pub const RECORD_NOT_FOUND: &str = "record not found";
pub const NOT_MANAGED: &str = "vault document is no longer managed";

/// Line placed between record and vault notes when both are kept.
pub const MERGE_SEPARATOR: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Resolved {
        record_id: RecordId,
        policy: ConflictPolicy,
        changed_fields: Vec<Field>,
    },
    Failed {
        record_id: RecordId,
        policy: ConflictPolicy,
        reason: String,
    },
}

impl ResolutionOutcome {
    pub fn record_id(&self) -> &RecordId {
        match self {
            ResolutionOutcome::Resolved { record_id, .. }
            | ResolutionOutcome::Failed { record_id, .. } => record_id,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionOutcome::Resolved { .. })
    }

    /// Whether the conflict should leave the queue. Manual declines and
    /// transient failures stay queued; a vanished record never comes back.
    pub fn settles_conflict(&self) -> bool {
        match self {
            ResolutionOutcome::Resolved { .. } => true,
            ResolutionOutcome::Failed { reason, .. } => reason == RECORD_NOT_FOUND,
        }
    }
}

/// Apply `policy` to `conflict`.
pub fn resolve<S: RecordStore>(
    store: &mut S,
    config: &SyncConfig,
    renderer: &Renderer,
    conflict: &Conflict,
    policy: ConflictPolicy,
) -> ResolutionOutcome {
    let result = match policy {
        ConflictPolicy::VaultWins => vault_wins(store, conflict),
        ConflictPolicy::RecordWins => record_wins(store, config, renderer, conflict),
        ConflictPolicy::Merge => merge(store, config, renderer, conflict),
        ConflictPolicy::Manual => Err(MANUAL_REQUIRED.to_string()),
    };
    let record_id = conflict.record_id.clone();
    match result {
        Ok(changed_fields) => {
            tracing::info!(
                "resolved conflict for {record_id} ({policy}): {} field(s)",
                changed_fields.len()
            );
            ResolutionOutcome::Resolved {
                record_id,
                policy,
                changed_fields,
            }
        }
        Err(reason) => {
            tracing::warn!("conflict for {record_id} not resolved ({policy}): {reason}");
            ResolutionOutcome::Failed {
                record_id,
                policy,
                reason,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

fn vault_wins<S: RecordStore>(store: &mut S, conflict: &Conflict) -> Result<Vec<Field>, String> {
    let record = fetch(store, &conflict.record_id)?;
    let doc = read_managed(&conflict.path, &conflict.record_id)?;
    let patch = update_set(&record, &doc);
    if patch.is_empty() {
        return Ok(Vec::new());
    }
    apply(store, &record.id, &patch)?;
    Ok(patch.fields())
}

fn record_wins<S: RecordStore>(
    store: &mut S,
    config: &SyncConfig,
    renderer: &Renderer,
    conflict: &Conflict,
) -> Result<Vec<Field>, String> {
    let record = fetch(store, &conflict.record_id)?;
    write_record(store, config, renderer, &record, &conflict.path, Utc::now())
        .map_err(|e| e.to_string())?;
    Ok(conflict.fields())
}

fn merge<S: RecordStore>(
    store: &mut S,
    config: &SyncConfig,
    renderer: &Renderer,
    conflict: &Conflict,
) -> Result<Vec<Field>, String> {
    let record = fetch(store, &conflict.record_id)?;
    let doc = read_managed(&conflict.path, &conflict.record_id)?;

    let vault_read = doc.metadata.get_bool(keys::READ);
    let vault_favorite = doc.metadata.get_bool(keys::FAVORITE);
    let vault_notes = doc.notes.trim();

    let is_read = record.is_read || vault_read.unwrap_or(false);
    let is_favorite = record.is_favorite || vault_favorite.unwrap_or(false);
    let notes = merge_notes(record.notes_text(), vault_notes);

    let mut changed = BTreeSet::new();
    let mut patch = RecordPatch::default();
    if is_read != record.is_read {
        patch.is_read = Some(is_read);
    }
    if is_favorite != record.is_favorite {
        patch.is_favorite = Some(is_favorite);
    }
    if notes != record.notes_text() {
        patch.notes = Some(notes.clone());
    }
    changed.extend(patch.fields());
    if vault_read.is_some_and(|v| v != is_read) {
        changed.insert(Field::IsRead);
    }
    if vault_favorite.is_some_and(|v| v != is_favorite) {
        changed.insert(Field::IsFavorite);
    }
    if vault_notes != notes {
        changed.insert(Field::Notes);
    }

    if !patch.is_empty() {
        apply(store, &record.id, &patch)?;
    }
    let merged = fetch(store, &record.id)?;
    write_record(store, config, renderer, &merged, &conflict.path, Utc::now())
        .map_err(|e| e.to_string())?;
    Ok(changed.into_iter().collect())
}

// ---------------------------------------------------------------------------
// Helpers shared with the import pass
// ---------------------------------------------------------------------------

/// Values in `doc` that differ from `record`: read, favorite, archived,
/// progress (clamped to `0..=1`) and notes (compared trimmed).
pub fn update_set(record: &Record, doc: &ManagedDocument) -> RecordPatch {
    let mut patch = RecordPatch::default();
    let meta = &doc.metadata;
    if let Some(v) = meta.get_bool(keys::READ).filter(|v| *v != record.is_read) {
        patch.is_read = Some(v);
    }
    if let Some(v) = meta.get_bool(keys::FAVORITE).filter(|v| *v != record.is_favorite) {
        patch.is_favorite = Some(v);
    }
    if let Some(v) = meta.get_bool(keys::ARCHIVED).filter(|v| *v != record.is_archived) {
        patch.is_archived = Some(v);
    }
    if let Some(v) = meta.get_f64(keys::PROGRESS).map(|p| p.clamp(0.0, 1.0)) {
        if (v - record.progress).abs() > f64::EPSILON {
            patch.progress = Some(v);
        }
    }
    let notes = doc.notes.trim();
    if notes != record.notes_text() {
        patch.notes = Some(notes.to_string());
    }
    patch
}

/// Combine two notes texts. Both present and different → record first,
/// separator line, vault second; otherwise whichever side has text.
pub fn merge_notes(record: &str, vault: &str) -> String {
    let (record, vault) = (record.trim(), vault.trim());
    match (record.is_empty(), vault.is_empty()) {
        (false, false) if record != vault => {
            format!("{record}\n\n{MERGE_SEPARATOR}\n\n{vault}")
        }
        (false, _) => record.to_string(),
        (true, _) => vault.to_string(),
    }
}

fn fetch<S: RecordStore>(store: &S, id: &RecordId) -> Result<Record, String> {
    store
        .fetch_by_id(id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| RECORD_NOT_FOUND.to_string())
}

fn apply<S: RecordStore>(store: &mut S, id: &RecordId, patch: &RecordPatch) -> Result<(), String> {
    match store.update_fields(id, patch) {
        Ok(0) => Err(RECORD_NOT_FOUND.to_string()),
        Ok(_) => Ok(()),
        Err(e) => Err(e.to_string()),
    }
}

fn read_managed(path: &Path, id: &RecordId) -> Result<ManagedDocument, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    match classify(&text) {
        Parsed::Managed(doc) if &doc.record_id == id => Ok(doc),
        _ => Err(NOT_MANAGED.to_string()),
    }
}
