//! `shelf config show` and `shelf config set …`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use shelf_core::{
    config as shelf_config, ConfigError, ConfigPatch, ConflictPolicy, LayoutMode, SyncDirection,
    TemplateKind,
};

use super::home_dir;

/// Show or change `~/.shelf/config.yaml`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the current configuration as YAML.
    Show,

    /// Change one or more settings. The first call must set `--vault-root`.
    Set(SetArgs),
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Vault directory. Relative paths are taken from the current directory.
    #[arg(long, value_name = "DIR")]
    pub vault_root: Option<PathBuf>,

    /// Folder inside the vault that receives exported documents.
    #[arg(long)]
    pub folder: Option<String>,

    /// by-date | by-domain | flat
    #[arg(long)]
    pub layout: Option<LayoutMode>,

    /// default | minimal | detailed
    #[arg(long)]
    pub template: Option<TemplateKind>,

    /// export-only | import-only | both
    #[arg(long)]
    pub direction: Option<SyncDirection>,

    /// vault-wins | record-wins | merge | manual
    #[arg(long)]
    pub policy: Option<ConflictPolicy>,

    /// Snapshot all records before each full sync.
    #[arg(long, value_name = "BOOL")]
    pub backup: Option<bool>,

    /// Directory of `.tera` files overriding the built-in templates
    /// (`default.md.tera`, `shared/_notes.tera`, ...). Pass "" to reset.
    #[arg(long, value_name = "DIR")]
    pub templates_dir: Option<PathBuf>,
}

pub fn run(cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(),
        ConfigCommand::Set(args) => set(args),
    }
}

fn show() -> Result<()> {
    let home = home_dir()?;
    match shelf_config::load_at(&home) {
        Ok(config) => {
            let yaml = serde_yaml::to_string(&config).context("failed to serialize config")?;
            print!("{yaml}");
            Ok(())
        }
        Err(ConfigError::ConfigNotFound { .. }) => {
            println!("No sync configuration.");
            println!("Run: shelf config set --vault-root <dir>");
            Ok(())
        }
        Err(err) => Err(err).context("failed to load sync configuration"),
    }
}

fn set(args: SetArgs) -> Result<()> {
    let home = home_dir()?;
    let patch = ConfigPatch {
        vault_root: args.vault_root.map(absolute).transpose()?,
        folder: args.folder,
        layout: args.layout,
        template: args.template,
        direction: args.direction,
        conflict_policy: args.policy,
        backup_before_sync: args.backup,
        templates_dir: args.templates_dir.map(absolute).transpose()?,
    };
    let config = shelf_config::update_at(&home, &patch).map_err(|err| match err {
        ConfigError::MissingVaultRoot => anyhow::anyhow!(
            "no vault configured yet; pass --vault-root <dir>"
        ),
        other => anyhow::Error::new(other).context("failed to update sync configuration"),
    })?;

    println!("✓ Saved {}", shelf_config::config_path_at(&home).display());
    println!("  vault: {}", config.sync_root().display());
    if let Some(dir) = &config.templates_dir {
        println!("  templates: {}", dir.display());
    }
    Ok(())
}

/// Relative paths are taken from the current directory; empty stays empty.
fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.as_os_str().is_empty() || path.is_absolute() {
        return Ok(path);
    }
    Ok(std::env::current_dir()
        .context("cannot resolve current directory")?
        .join(path))
}
