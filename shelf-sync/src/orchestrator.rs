//! Sync orchestrator.
//!
//! ```text
//! Idle → Backing-up? → Exporting? → Importing? → Resolving? → Idle
//! ```
//!
//! Every pass is sequential and starts fresh. Per-item problems land in the
//! pass report; only configuration/store failures (and a failed backup
//! during [`Orchestrator::full_sync`]) abort a call.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use shelf_core::types::{ConfigPatch, ConflictPolicy, RecordId, SyncConfig};
use shelf_core::RecordStore;
use shelf_renderer::Renderer;
use shelf_vault::layout::relative_to;
use shelf_vault::{classify, scan, Parsed, VaultDocument, WriteResult};

use crate::backup::{backup_path, write_backup};
use crate::cancel::CancelToken;
use crate::conflict::{detect, Conflict};
use crate::diff::{diff_record, RecordDiff};
use crate::error::SyncError;
use crate::export::{pending_vault_edit, target_path, write_record};
use crate::report::{
    ExportItem, ExportOutcome, ExportReport, FullSyncReport, ImportItem, ImportOutcome,
    ImportReport, SyncStatus,
};
use crate::resolve::{resolve, update_set, ResolutionOutcome};

/// Reason attached to import items skipped because the record changed in
/// the app after its last export.
pub const UNEXPORTED_CHANGES: &str = "record has unexported changes";
/// Reason attached to vault documents without `record_id`/`url`.
pub const UNMANAGED: &str = "unmanaged document";

/// Drives export, import and conflict resolution for one vault.
///
/// Holds the only copy of the [`SyncConfig`] and the conflict queue. All
/// mutating operations take `&mut self`; a single orchestrator is never
/// driven by two passes at once.
pub struct Orchestrator<S: RecordStore> {
    store: S,
    config: SyncConfig,
    renderer: Renderer,
    queue: Vec<Conflict>,
    cancel: CancelToken,
}

impl<S: RecordStore> Orchestrator<S> {
    /// Orchestrator rendering with the embedded templates, or with the
    /// config's `templates_dir` overrides.
    pub fn new(store: S, config: SyncConfig) -> Result<Self, SyncError> {
        let renderer = Renderer::for_config(&config)?;
        Self::with_renderer(store, config, renderer)
    }

    pub fn with_renderer(
        store: S,
        config: SyncConfig,
        renderer: Renderer,
    ) -> Result<Self, SyncError> {
        config.validate()?;
        Ok(Orchestrator {
            store,
            config,
            renderer,
            queue: Vec::new(),
            cancel: CancelToken::new(),
        })
    }

    /// Seed the queue with conflicts persisted by an earlier run.
    pub fn with_conflicts(mut self, conflicts: Vec<Conflict>) -> Self {
        for conflict in conflicts {
            self.enqueue(conflict);
        }
        self
    }

    /// Handle for cancelling a running pass from elsewhere.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Apply a partial update. An invalid result, or a template directory
    /// that does not load, leaves the current config in place.
    pub fn update_config(&mut self, patch: &ConfigPatch) -> Result<&SyncConfig, SyncError> {
        let next = self.config.apply(patch)?;
        if next.templates_dir != self.config.templates_dir {
            self.renderer = Renderer::for_config(&next)?;
        }
        self.config = next;
        Ok(&self.config)
    }

    // -----------------------------------------------------------------------
    // Conflict queue
    // -----------------------------------------------------------------------

    pub fn conflicts(&self) -> &[Conflict] {
        &self.queue
    }

    fn enqueue(&mut self, conflict: Conflict) {
        self.queue
            .retain(|c| !(c.record_id == conflict.record_id && c.path == conflict.path));
        self.queue.push(conflict);
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Render and write every unsynced record.
    ///
    /// A document edited in the vault since the record's last export is not
    /// overwritten when it conflicts with the record; the conflict is queued
    /// for the configured policy instead.
    pub fn export_pass(&mut self) -> Result<ExportReport, SyncError> {
        let records = self.store.fetch_unsynced()?;
        tracing::info!("export pass: {} unsynced record(s)", records.len());

        let mut report = ExportReport::default();
        for record in records {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let path = match target_path(&record, &self.config) {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!("export of {} failed: {err}", record.id);
                    report.push(ExportItem {
                        record_id: record.id.clone(),
                        path: None,
                        outcome: ExportOutcome::Failed { reason: err.to_string() },
                    });
                    continue;
                }
            };

            if let Some(conflict) = pending_vault_edit(&record, &self.config, &path) {
                let fields = conflict.fields();
                tracing::info!(
                    "holding back export of {}: vault copy edited since last export",
                    record.id
                );
                self.enqueue(conflict);
                report.push(ExportItem {
                    record_id: record.id.clone(),
                    path: Some(path),
                    outcome: ExportOutcome::Conflict { fields },
                });
                continue;
            }

            let outcome = match write_record(
                &mut self.store,
                &self.config,
                &self.renderer,
                &record,
                &path,
                Utc::now(),
            ) {
                Ok(WriteResult::Written { .. }) => ExportOutcome::Written,
                Ok(WriteResult::Unchanged { .. }) => ExportOutcome::Unchanged,
                Err(err) => {
                    tracing::warn!("export of {} failed: {err}", record.id);
                    ExportOutcome::Failed { reason: err.to_string() }
                }
            };
            report.push(ExportItem {
                record_id: record.id.clone(),
                path: Some(path),
                outcome,
            });
        }

        tracing::info!(
            "export pass done: {} written, {} unchanged, {} conflict(s), {} failed",
            report.synced,
            report.unchanged,
            report.conflicts,
            report.failed
        );
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Import
    // -----------------------------------------------------------------------

    /// Scan the vault and pull document edits back into the store.
    pub fn import_pass(&mut self) -> Result<ImportReport, SyncError> {
        let docs = scan(&self.config.sync_root());
        tracing::info!("import pass: {} document(s)", docs.len());

        let mut report = ImportReport::default();
        for doc in docs {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let item = self.import_document(&doc);
            report.push(item);
        }

        tracing::info!(
            "import pass done: {} updated, {} unchanged, {} conflict(s), {} orphaned, {} skipped, {} failed",
            report.updated,
            report.no_changes,
            report.conflicts,
            report.orphaned,
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    fn import_document(&mut self, doc: &VaultDocument) -> ImportItem {
        let path = relative_to(&self.config.vault_root, &doc.path)
            .unwrap_or_else(|_| doc.relative_path.clone());

        let Parsed::Managed(managed) = classify(&doc.content) else {
            tracing::debug!("skipping unmanaged document {}", path.display());
            return ImportItem {
                path,
                record_id: None,
                outcome: ImportOutcome::Skipped { reason: UNMANAGED.to_string() },
            };
        };
        let record_id = Some(managed.record_id.clone());

        let record = match self.store.fetch_by_id(&managed.record_id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::debug!("orphaned document {} ({})", path.display(), managed.record_id);
                return ImportItem { path, record_id, outcome: ImportOutcome::Orphaned };
            }
            Err(err) => {
                return ImportItem {
                    path,
                    record_id,
                    outcome: ImportOutcome::Failed { reason: err.to_string() },
                };
            }
        };

        if let Some(conflict) = detect(
            &record,
            &managed.metadata,
            &managed.notes,
            &doc.path,
            doc.modified_at,
        ) {
            let fields = conflict.fields();
            tracing::info!("conflict on {} ({} field(s))", record.id, fields.len());
            self.enqueue(conflict);
            return ImportItem { path, record_id, outcome: ImportOutcome::Conflict { fields } };
        }

        let patch = update_set(&record, &managed);
        if patch.is_empty() {
            return ImportItem { path, record_id, outcome: ImportOutcome::NoChanges };
        }
        if record.needs_export() {
            return ImportItem {
                path,
                record_id,
                outcome: ImportOutcome::Skipped { reason: UNEXPORTED_CHANGES.to_string() },
            };
        }

        let outcome = match self.store.update_fields(&record.id, &patch) {
            Ok(0) => ImportOutcome::Orphaned,
            Ok(_) => {
                tracing::info!("updated {} from {}", record.id, path.display());
                ImportOutcome::Updated { fields: patch.fields() }
            }
            Err(err) => {
                tracing::warn!("import of {} failed: {err}", path.display());
                ImportOutcome::Failed { reason: err.to_string() }
            }
        };
        ImportItem { path, record_id, outcome }
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Resolve every queued conflict with the configured policy.
    pub fn resolve_queued_conflicts(&mut self) -> Result<Vec<ResolutionOutcome>, SyncError> {
        let policy = self.config.conflict_policy;
        let queued = std::mem::take(&mut self.queue);
        let mut outcomes = Vec::with_capacity(queued.len());
        for conflict in queued {
            if self.cancel.is_cancelled() {
                self.queue.push(conflict);
                continue;
            }
            let outcome = self.resolve_one(&conflict, policy);
            if !outcome.settles_conflict() {
                self.queue.push(conflict);
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Resolve the queued conflict(s) for one record with an explicit policy.
    pub fn resolve_conflict(
        &mut self,
        record_id: &RecordId,
        policy: ConflictPolicy,
    ) -> Result<Vec<ResolutionOutcome>, SyncError> {
        let (matching, rest): (Vec<Conflict>, Vec<Conflict>) = std::mem::take(&mut self.queue)
            .into_iter()
            .partition(|c| &c.record_id == record_id);
        self.queue = rest;
        if matching.is_empty() {
            return Err(SyncError::ConflictNotFound(record_id.0.clone()));
        }

        let mut outcomes = Vec::with_capacity(matching.len());
        for conflict in matching {
            let outcome = self.resolve_one(&conflict, policy);
            if !outcome.settles_conflict() {
                self.queue.push(conflict);
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    fn resolve_one(&mut self, conflict: &Conflict, policy: ConflictPolicy) -> ResolutionOutcome {
        resolve(&mut self.store, &self.config, &self.renderer, conflict, policy)
    }

    // -----------------------------------------------------------------------
    // Full sync
    // -----------------------------------------------------------------------

    /// Snapshot every record under `<vault_root>/.shelf-backups/`.
    pub fn backup(&self) -> Result<PathBuf, SyncError> {
        self.backup_at(Utc::now())
    }

    fn backup_at(&self, at: DateTime<Utc>) -> Result<PathBuf, SyncError> {
        let records = self.store.fetch_all()?;
        write_backup(&self.config.vault_root, records, at)
    }

    /// Backup, export and/or import per direction, then settle the queue.
    pub fn full_sync(&mut self) -> Result<FullSyncReport, SyncError> {
        let started_at = Utc::now();
        let direction = self.config.direction;
        let policy = self.config.conflict_policy;

        let backup = if self.config.backup_before_sync {
            let written = self.backup_at(started_at).map_err(|err| SyncError::Backup {
                path: backup_path(&self.config.vault_root, started_at),
                source: Box::new(err),
            })?;
            Some(written)
        } else {
            None
        };

        let export = if direction.exports() {
            Some(self.export_pass()?)
        } else {
            None
        };
        let export_cancelled = export.as_ref().is_some_and(|r| r.cancelled);

        let import = if direction.imports() && !export_cancelled {
            Some(self.import_pass()?)
        } else {
            None
        };
        let import_cancelled = import.as_ref().is_some_and(|r| r.cancelled);

        let cancelled = export_cancelled || import_cancelled || self.cancel.is_cancelled();
        let resolutions = if !cancelled && !self.queue.is_empty() {
            self.resolve_queued_conflicts()?
        } else {
            Vec::new()
        };

        Ok(FullSyncReport {
            started_at,
            finished_at: Utc::now(),
            direction,
            policy,
            backup,
            export,
            import,
            resolutions,
            cancelled,
        })
    }

    // -----------------------------------------------------------------------
    // Status and preview
    // -----------------------------------------------------------------------

    pub fn status(&self) -> Result<SyncStatus, SyncError> {
        let records = self.store.fetch_all()?;
        let unsynced = records.iter().filter(|r| r.needs_export()).count();
        let last_synced_at = records.iter().filter_map(|r| r.vault_synced_at).max();
        Ok(SyncStatus {
            vault_root: self.config.vault_root.clone(),
            folder: self.config.folder.clone(),
            layout: self.config.layout,
            template: self.config.template,
            direction: self.config.direction,
            policy: self.config.conflict_policy,
            backup_before_sync: self.config.backup_before_sync,
            templates_dir: self.config.templates_dir.clone(),
            total_records: records.len(),
            synced_records: records.len() - unsynced,
            unsynced_records: unsynced,
            last_synced_at,
            pending_conflicts: self.queue.len(),
        })
    }

    /// Unified diff between a record's document and its fresh rendering.
    pub fn diff_record(&self, record_id: &RecordId) -> Result<RecordDiff, SyncError> {
        let record = self
            .store
            .fetch_by_id(record_id)?
            .ok_or_else(|| SyncError::RecordNotFound(record_id.0.clone()))?;
        diff_record(&record, &self.config, &self.renderer)
    }
}
