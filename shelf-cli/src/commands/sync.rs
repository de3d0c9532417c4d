//! `shelf export`, `shelf import` and `shelf sync`.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use shelf_core::{ConfigPatch, ConflictPolicy, SyncDirection};
use shelf_sync::{
    ExportOutcome, ExportReport, FullSyncReport, ImportOutcome, ImportReport, ResolutionOutcome,
};

use super::Session;

/// Arguments for `shelf sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Override the configured direction for this run.
    #[arg(long, value_name = "DIRECTION")]
    pub direction: Option<SyncDirection>,

    /// Override the configured conflict policy for this run.
    #[arg(long, value_name = "POLICY")]
    pub policy: Option<ConflictPolicy>,

    /// Emit the full report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let mut session = Session::open()?;
        let overrides = ConfigPatch {
            direction: self.direction,
            conflict_policy: self.policy,
            ..ConfigPatch::default()
        };
        session
            .orchestrator
            .update_config(&overrides)
            .context("invalid sync options")?;

        let result = session.orchestrator.full_sync();
        session.close()?;
        let report = result.context("sync failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize sync report")?
            );
        } else {
            print_full_sync(&report);
        }
        fail_on_errors(
            report.export.as_ref().map_or(0, |r| r.failed),
            report.import.as_ref().map_or(0, |r| r.failed),
        )
    }
}

/// `shelf export`
pub fn export() -> Result<()> {
    let mut session = Session::open()?;
    let result = session.orchestrator.export_pass();
    session.close()?;
    let report = result.context("export failed")?;
    print_export(&report);
    if report.conflicts > 0 {
        println!("Run 'shelf conflicts' to review, 'shelf resolve' to settle.");
    }
    fail_on_errors(report.failed, 0)
}

/// `shelf import`
pub fn import() -> Result<()> {
    let mut session = Session::open()?;
    let result = session.orchestrator.import_pass();
    session.close()?;
    let report = result.context("import failed")?;
    print_import(&report);
    if report.conflicts > 0 {
        println!("Run 'shelf conflicts' to review, 'shelf resolve' to settle.");
    }
    fail_on_errors(0, report.failed)
}

fn fail_on_errors(export_failed: usize, import_failed: usize) -> Result<()> {
    match (export_failed, import_failed) {
        (0, 0) => Ok(()),
        (e, 0) => bail!("{e} record(s) failed to export"),
        (0, i) => bail!("{i} document(s) failed to import"),
        (e, i) => bail!("{e} record(s) failed to export, {i} document(s) failed to import"),
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_full_sync(report: &FullSyncReport) {
    println!(
        "sync ({}, {}) finished in {}ms",
        report.direction,
        report.policy,
        (report.finished_at - report.started_at).num_milliseconds()
    );
    if let Some(path) = &report.backup {
        println!("  backup: {}", path.display());
    }
    if let Some(export) = &report.export {
        print_export(export);
    }
    if let Some(import) = &report.import {
        print_import(import);
    }
    for outcome in &report.resolutions {
        match outcome {
            ResolutionOutcome::Resolved { record_id, policy, changed_fields } => {
                let fields: Vec<String> = changed_fields.iter().map(|f| f.to_string()).collect();
                println!(
                    "  {} {record_id} resolved ({policy}) {}",
                    "✓".green(),
                    fields.join(", ")
                );
            }
            ResolutionOutcome::Failed { record_id, policy, reason } => {
                println!("  {} {record_id} not resolved ({policy}): {reason}", "!".yellow());
            }
        }
    }
    if report.cancelled {
        println!("{}", "sync cancelled".yellow());
    }
}

fn print_export(report: &ExportReport) {
    println!(
        "{} export: {} written, {} unchanged, {} conflict(s), {} failed",
        if report.failed == 0 { "✓".green() } else { "✗".red() },
        report.synced,
        report.unchanged,
        report.conflicts,
        report.failed
    );
    for item in &report.items {
        let location = item
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| item.record_id.to_string());
        match &item.outcome {
            ExportOutcome::Written => println!("  ✎  {location}"),
            ExportOutcome::Unchanged => {}
            ExportOutcome::Conflict { fields } => {
                let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
                println!("  {}  {location} ({})", "⚡".yellow(), fields.join(", "));
            }
            ExportOutcome::Failed { reason } => {
                println!("  {}  {location}: {reason}", "✗".red())
            }
        }
    }
}

fn print_import(report: &ImportReport) {
    println!(
        "{} import: {} updated, {} unchanged, {} conflict(s), {} orphaned, {} skipped, {} failed",
        if report.failed == 0 { "✓".green() } else { "✗".red() },
        report.updated,
        report.no_changes,
        report.conflicts,
        report.orphaned,
        report.skipped,
        report.failed
    );
    for item in &report.items {
        let path = item.path.display();
        match &item.outcome {
            ImportOutcome::Updated { fields } => {
                let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
                println!("  ←  {path} ({})", fields.join(", "));
            }
            ImportOutcome::Conflict { fields } => {
                let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
                println!("  {}  {path} ({})", "⚡".yellow(), fields.join(", "));
            }
            ImportOutcome::Failed { reason } => println!("  {}  {path}: {reason}", "✗".red()),
            ImportOutcome::NoChanges
            | ImportOutcome::Orphaned
            | ImportOutcome::Skipped { .. } => {}
        }
    }
}
