//! `shelf status`: configuration and sync visibility.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use shelf_sync::{format_age, SyncStatus};

use super::Session;

/// Arguments for `shelf status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "setting")]
    name: &'static str,
    #[tabled(rename = "value")]
    value: String,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::open()?;
        let status = session
            .orchestrator
            .status()
            .context("failed to read sync status")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&status).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        print_table(&status);
        Ok(())
    }
}

fn print_table(status: &SyncStatus) {
    let last_sync = status
        .last_synced_at
        .map(|at| format!("{} ago", format_age(at)))
        .unwrap_or_else(|| "never".to_string());
    println!(
        "Shelf v{} | {} records | {} synced | {} pending | last sync {}",
        env!("CARGO_PKG_VERSION"),
        status.total_records,
        status.synced_records.to_string().green(),
        pending(status.unsynced_records),
        last_sync,
    );

    let rows = vec![
        SettingRow { name: "vault", value: status.vault_root.display().to_string() },
        SettingRow { name: "folder", value: status.folder.clone() },
        SettingRow { name: "layout", value: status.layout.to_string() },
        SettingRow { name: "template", value: status.template.to_string() },
        SettingRow { name: "direction", value: status.direction.to_string() },
        SettingRow { name: "conflict policy", value: status.policy.to_string() },
        SettingRow { name: "backup before sync", value: status.backup_before_sync.to_string() },
        SettingRow {
            name: "templates",
            value: status
                .templates_dir
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| "built-in".to_string()),
        },
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if status.pending_conflicts > 0 {
        println!(
            "{} queued conflict(s). Run 'shelf conflicts' to review.",
            status.pending_conflicts.to_string().yellow().bold()
        );
    }
    if status.unsynced_records > 0 {
        println!("Run 'shelf export' or 'shelf sync' to update the vault.");
    }
}

fn pending(count: usize) -> String {
    if count == 0 {
        count.to_string().green().to_string()
    } else {
        count.to_string().yellow().to_string()
    }
}
