pub mod config;
pub mod conflicts;
pub mod diff;
pub mod resolve;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use shelf_core::{config as shelf_config, ConfigError, JsonRecordStore, SyncConfig};
use shelf_sync::{queue_store, Orchestrator};

/// `$HOME`, or an error telling the user why nothing can run.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

/// Saved config, with a hint when `shelf config set` has never been run.
pub fn load_config(home: &Path) -> Result<SyncConfig> {
    match shelf_config::load_at(home) {
        Ok(config) => Ok(config),
        Err(ConfigError::ConfigNotFound { path }) => Err(anyhow::anyhow!(
            "no sync configuration at {}; run `shelf config set --vault-root <dir>` first",
            path.display()
        )),
        Err(err) => Err(err).context("failed to load sync configuration"),
    }
}

/// One CLI invocation's view of the engine: the orchestrator plus the home
/// directory its conflict queue is persisted under.
pub struct Session {
    home: PathBuf,
    pub orchestrator: Orchestrator<JsonRecordStore>,
}

impl Session {
    pub fn open() -> Result<Self> {
        Self::open_at(home_dir()?)
    }

    pub fn open_at(home: PathBuf) -> Result<Self> {
        let config = load_config(&home)?;
        let store = JsonRecordStore::open_at(&home).context("failed to open record store")?;
        let queued = queue_store::load_at(&home).context("failed to load conflict queue")?;
        tracing::debug!("loaded {} queued conflict(s)", queued.len());
        let orchestrator = Orchestrator::new(store, config)
            .context("failed to start sync engine")?
            .with_conflicts(queued);
        Ok(Session { home, orchestrator })
    }

    /// Persist the conflict queue as the orchestrator left it.
    pub fn close(self) -> Result<()> {
        queue_store::save_at(&self.home, self.orchestrator.conflicts())
            .context("failed to save conflict queue")
    }
}
