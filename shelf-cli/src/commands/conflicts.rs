//! `shelf conflicts`: list conflicts queued by earlier imports.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use shelf_sync::{format_age, queue_store, Conflict};

use super::home_dir;

/// Arguments for `shelf conflicts`.
#[derive(Args, Debug)]
pub struct ConflictsArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct ConflictRow {
    #[tabled(rename = "record")]
    record: String,
    #[tabled(rename = "field")]
    field: String,
    #[tabled(rename = "app")]
    record_value: String,
    #[tabled(rename = "vault")]
    vault_value: String,
    #[tabled(rename = "vault edited")]
    edited: String,
}

impl ConflictsArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let conflicts = queue_store::load_at(&home).context("failed to load conflict queue")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&conflicts)
                    .context("failed to serialize conflicts")?
            );
            return Ok(());
        }

        if conflicts.is_empty() {
            println!("No pending conflicts.");
            return Ok(());
        }

        println!("{} pending conflict(s)", conflicts.len().to_string().yellow().bold());
        let mut table = Table::new(rows(&conflicts));
        table.with(Style::rounded());
        println!("{table}");
        for conflict in &conflicts {
            println!("  {}: {}", conflict.record_id, conflict.path.display());
        }
        println!("Run 'shelf resolve <record-id> --policy <policy>' to settle one.");
        Ok(())
    }
}

fn rows(conflicts: &[Conflict]) -> Vec<ConflictRow> {
    conflicts
        .iter()
        .flat_map(|c| {
            c.divergences.iter().map(|d| ConflictRow {
                record: c.record_id.to_string(),
                field: d.field.to_string(),
                record_value: shorten(&d.record_value),
                vault_value: shorten(&d.vault_value),
                edited: format!("{} ago", format_age(c.file_modified_at)),
            })
        })
        .collect()
}

fn shorten(value: &str) -> String {
    const MAX: usize = 40;
    let flat = value.replace('\n', " ⏎ ");
    if flat.chars().count() <= MAX {
        return flat;
    }
    let mut out: String = flat.chars().take(MAX - 1).collect();
    out.push('…');
    out
}
