//! Shared write-back path: pick a record's document location, render, write,
//! and mark the record synced.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use shelf_core::types::{Record, RecordId, RecordPatch, SyncConfig};
use shelf_core::RecordStore;
use shelf_renderer::Renderer;
use shelf_vault::layout::{
    disambiguated_file_name, document_path, folder_path, relative_to, resolve_in,
};
use shelf_vault::scanner::load;
use shelf_vault::{classify, write_document, Parsed, WriteResult};

use crate::conflict::{detect, Conflict};
use crate::error::SyncError;

/// Where `record` is (or will be) written.
///
/// A record that was exported before keeps its stored `vault_path`. A new
/// record gets the layout path, or `<title> (<id>).md` when that file
/// already belongs to something else.
pub(crate) fn target_path(record: &Record, config: &SyncConfig) -> Result<PathBuf, SyncError> {
    if let Some(relative) = &record.vault_path {
        return Ok(resolve_in(&config.vault_root, relative)?);
    }
    let preferred = document_path(record, config);
    if claimed_by_other(&preferred, &record.id) {
        let name = disambiguated_file_name(&record.title, record);
        return Ok(folder_path(record, config).join(name));
    }
    Ok(preferred)
}

fn claimed_by_other(path: &Path, id: &RecordId) -> bool {
    match std::fs::read_to_string(path) {
        Ok(text) => match classify(&text) {
            Parsed::Managed(doc) => &doc.record_id != id,
            Parsed::Unmanaged => true,
        },
        Err(_) => false,
    }
}

/// The conflict an export to `path` would paper over: the document was edited
/// after the record's last export, is strictly newer than the record and
/// disagrees on a tracked field.
///
/// An unreadable or missing document, or one that now names a different
/// record, never blocks the export.
pub(crate) fn pending_vault_edit(
    record: &Record,
    config: &SyncConfig,
    path: &Path,
) -> Option<Conflict> {
    let synced_at = record.vault_synced_at?;
    let doc = load(&config.vault_root, path).ok()?;
    if doc.modified_at <= synced_at {
        return None;
    }
    match classify(&doc.content) {
        Parsed::Managed(managed) if managed.record_id == record.id => detect(
            record,
            &managed.metadata,
            &managed.notes,
            &doc.path,
            doc.modified_at,
        ),
        _ => None,
    }
}

/// Render `record`, write it to `path`, then record `vault_path` and
/// `vault_synced_at`. The bookkeeping update happens only after the write
/// succeeded.
pub(crate) fn write_record<S: RecordStore>(
    store: &mut S,
    config: &SyncConfig,
    renderer: &Renderer,
    record: &Record,
    path: &Path,
    now: DateTime<Utc>,
) -> Result<WriteResult, SyncError> {
    let content = renderer.render(record, config.template)?;
    let result = write_document(path, &content)?;
    let relative = relative_to(&config.vault_root, path)?;
    if store.update_fields(&record.id, &RecordPatch::synced(&relative, now))? == 0 {
        return Err(SyncError::RecordNotFound(record.id.0.clone()));
    }
    Ok(result)
}
