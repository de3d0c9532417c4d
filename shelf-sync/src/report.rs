//! Pass reports returned to the sync controller.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use shelf_core::types::{
    ConflictPolicy, Field, LayoutMode, RecordId, SyncDirection, TemplateKind,
};

use crate::resolve::ResolutionOutcome;

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportOutcome {
    Written,
    Unchanged,
    /// The document was edited in the vault after the last export; the write
    /// was held back and a conflict queued.
    Conflict { fields: Vec<Field> },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportItem {
    pub record_id: RecordId,
    /// Target document, when one could be computed.
    pub path: Option<PathBuf>,
    #[serde(flatten)]
    pub outcome: ExportOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    /// Documents written.
    pub synced: usize,
    /// Documents whose rendered content already matched the vault.
    pub unchanged: usize,
    pub conflicts: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub items: Vec<ExportItem>,
}

impl ExportReport {
    pub(crate) fn push(&mut self, item: ExportItem) {
        match item.outcome {
            ExportOutcome::Written => self.synced += 1,
            ExportOutcome::Unchanged => self.unchanged += 1,
            ExportOutcome::Conflict { .. } => self.conflicts += 1,
            ExportOutcome::Failed { .. } => self.failed += 1,
        }
        self.items.push(item);
    }
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportOutcome {
    Updated { fields: Vec<Field> },
    NoChanges,
    Conflict { fields: Vec<Field> },
    /// The document names a record the store does not have.
    Orphaned,
    Skipped { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportItem {
    /// Path relative to the vault root.
    pub path: PathBuf,
    pub record_id: Option<RecordId>,
    #[serde(flatten)]
    pub outcome: ImportOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub updated: usize,
    pub no_changes: usize,
    pub conflicts: usize,
    pub orphaned: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub items: Vec<ImportItem>,
}

impl ImportReport {
    pub(crate) fn push(&mut self, item: ImportItem) {
        match item.outcome {
            ImportOutcome::Updated { .. } => self.updated += 1,
            ImportOutcome::NoChanges => self.no_changes += 1,
            ImportOutcome::Conflict { .. } => self.conflicts += 1,
            ImportOutcome::Orphaned => self.orphaned += 1,
            ImportOutcome::Skipped { .. } => self.skipped += 1,
            ImportOutcome::Failed { .. } => self.failed += 1,
        }
        self.items.push(item);
    }
}

// ---------------------------------------------------------------------------
// Full sync
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FullSyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub direction: SyncDirection,
    pub policy: ConflictPolicy,
    /// Backup snapshot written before any mutation.
    pub backup: Option<PathBuf>,
    pub export: Option<ExportReport>,
    pub import: Option<ImportReport>,
    pub resolutions: Vec<ResolutionOutcome>,
    pub cancelled: bool,
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub vault_root: PathBuf,
    pub folder: String,
    pub layout: LayoutMode,
    pub template: TemplateKind,
    pub direction: SyncDirection,
    pub policy: ConflictPolicy,
    pub backup_before_sync: bool,
    pub templates_dir: Option<PathBuf>,
    pub total_records: usize,
    pub synced_records: usize,
    pub unsynced_records: usize,
    /// Latest `vault_synced_at` across all records.
    pub last_synced_at: Option<DateTime<Utc>>,
    pub pending_conflicts: usize,
}

/// Compact age (`42s`, `5m`, `3h`, `2d`) of `timestamp` relative to now.
pub fn format_age(timestamp: DateTime<Utc>) -> String {
    let seconds = Utc::now()
        .signed_duration_since(timestamp)
        .num_seconds()
        .max(0) as u64;
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
