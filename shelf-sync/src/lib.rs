//! # shelf-sync
//!
//! Reconciliation between the record store and the vault.
//!
//! Build an [`Orchestrator`] from a [`shelf_core::RecordStore`] and a
//! [`shelf_core::SyncConfig`], then call [`Orchestrator::export_pass`],
//! [`Orchestrator::import_pass`] or [`Orchestrator::full_sync`]. Conflicts
//! found during import are queued on the orchestrator; persist them between
//! runs with [`queue_store`].

pub mod backup;
pub mod cancel;
pub mod conflict;
pub mod diff;
pub mod error;
mod export;
pub mod orchestrator;
pub mod queue_store;
pub mod report;
pub mod resolve;

pub use cancel::CancelToken;
pub use conflict::{detect, Conflict, Divergence};
pub use diff::RecordDiff;
pub use error::SyncError;
pub use orchestrator::Orchestrator;
pub use report::{
    format_age, ExportItem, ExportOutcome, ExportReport, FullSyncReport, ImportItem,
    ImportOutcome, ImportReport, SyncStatus,
};
pub use resolve::{merge_notes, resolve, ResolutionOutcome};
