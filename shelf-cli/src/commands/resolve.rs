//! `shelf resolve [<record-id>] [--policy <policy>]`

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use shelf_core::{ConfigPatch, ConflictPolicy, RecordId};
use shelf_sync::ResolutionOutcome;

use super::Session;

/// Arguments for `shelf resolve`.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Resolve only this record's conflict (default: every queued conflict).
    pub record_id: Option<String>,

    /// Policy to apply instead of the configured one.
    #[arg(long, value_name = "POLICY")]
    pub policy: Option<ConflictPolicy>,
}

impl ResolveArgs {
    pub fn run(self) -> Result<()> {
        let mut session = Session::open()?;
        let orchestrator = &mut session.orchestrator;

        let result = match self.record_id {
            Some(id) => {
                let policy = self.policy.unwrap_or(orchestrator.config().conflict_policy);
                orchestrator
                    .resolve_conflict(&RecordId::from(id.clone()), policy)
                    .with_context(|| format!("cannot resolve '{id}'"))
            }
            None => {
                if orchestrator.conflicts().is_empty() {
                    println!("No pending conflicts.");
                    return Ok(());
                }
                let overrides = ConfigPatch {
                    conflict_policy: self.policy,
                    ..ConfigPatch::default()
                };
                orchestrator
                    .update_config(&overrides)
                    .context("invalid policy")?;
                orchestrator
                    .resolve_queued_conflicts()
                    .context("failed to resolve conflicts")
            }
        };
        let remaining = session.orchestrator.conflicts().len();
        session.close()?;
        let outcomes = result?;

        let mut unresolved = 0;
        for outcome in &outcomes {
            match outcome {
                ResolutionOutcome::Resolved { record_id, policy, changed_fields } => {
                    let fields: Vec<String> =
                        changed_fields.iter().map(|f| f.to_string()).collect();
                    println!(
                        "{} {record_id} resolved with {policy} ({})",
                        "✓".green(),
                        if fields.is_empty() { "no changes".to_string() } else { fields.join(", ") }
                    );
                }
                ResolutionOutcome::Failed { record_id, policy, reason } => {
                    unresolved += 1;
                    println!("{} {record_id} not resolved with {policy}: {reason}", "✗".red());
                }
            }
        }
        if remaining > 0 {
            println!("{remaining} conflict(s) still queued.");
        }
        if unresolved > 0 {
            bail!("{unresolved} conflict(s) not resolved");
        }
        Ok(())
    }
}
