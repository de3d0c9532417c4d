//! Shelf: mirror a reading list into a Markdown vault.
//!
//! # Usage
//!
//! ```text
//! shelf config show
//! shelf config set --vault-root <dir> [--folder ...] [--layout by-date|by-domain|flat] ...
//! shelf export
//! shelf import
//! shelf sync [--direction export-only|import-only|both] [--policy <policy>] [--json]
//! shelf conflicts [--json]
//! shelf resolve [<record-id>] [--policy vault-wins|record-wins|merge|manual]
//! shelf status [--json]
//! shelf diff <record-id>
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use commands::{
    config::ConfigCommand, conflicts::ConflictsArgs, diff::DiffArgs, resolve::ResolveArgs,
    status::StatusArgs, sync::SyncArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "shelf",
    version,
    about = "Keep a reading list and a Markdown vault in sync",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write every new or edited record to the vault.
    Export,

    /// Pull edits made in the vault back into the reading list.
    Import,

    /// Backup, export, import and resolve conflicts in one run.
    Sync(SyncArgs),

    /// List conflicts found by earlier imports.
    Conflicts(ConflictsArgs),

    /// Settle queued conflicts.
    Resolve(ResolveArgs),

    /// Show sync configuration and record counts.
    Status(StatusArgs),

    /// Show the unified diff an export would apply to one record's document.
    Diff(DiffArgs),

    /// Show or change the sync configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Export => commands::sync::export(),
        Commands::Import => commands::sync::import(),
        Commands::Sync(args) => args.run(),
        Commands::Conflicts(args) => args.run(),
        Commands::Resolve(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Config { command } => commands::config::run(command),
    }
}
