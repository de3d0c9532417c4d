//! Persisted sync configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.shelf/
//!   config.yaml      (SyncConfig: mode 0600)
//!   records.json     (record store, see [`crate::store`])
//!   conflicts.json   (queued conflicts, owned by shelf-sync)
//! ```
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::types::{ConfigPatch, SyncConfig};

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.shelf/`: pure, no I/O.
pub fn shelf_dir_at(home: &Path) -> PathBuf {
    home.join(".shelf")
}

/// `<home>/.shelf/`, created with mode `0700` if it does not yet exist.
pub fn ensure_shelf_dir_at(home: &Path) -> Result<PathBuf, ConfigError> {
    let dir = shelf_dir_at(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_dir_permissions(&dir)?;
    }
    Ok(dir)
}

/// `<home>/.shelf/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    shelf_dir_at(home).join("config.yaml")
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load and validate `<home>/.shelf/config.yaml`.
///
/// Returns `ConfigError::ConfigNotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(home: &Path) -> Result<SyncConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    let config: SyncConfig =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })?;
    config.validate()?;
    Ok(config)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<SyncConfig, ConfigError> {
    load_at(&home()?)
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save `config` to `<home>/.shelf/config.yaml`.
///
/// Write flow: validate → serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, config: &SyncConfig) -> Result<(), ConfigError> {
    config.validate()?;
    ensure_shelf_dir_at(home)?;
    let path = config_path_at(home);
    let tmp_path = path.with_file_name("config.yaml.tmp");

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(config: &SyncConfig) -> Result<(), ConfigError> {
    save_at(&home()?, config)
}

// ---------------------------------------------------------------------------
// 4. Update
// ---------------------------------------------------------------------------

/// Apply `patch` to the stored config and persist the result.
///
/// When no config exists yet the patch must carry a vault root; every other
/// field takes its default.
pub fn update_at(home: &Path, patch: &ConfigPatch) -> Result<SyncConfig, ConfigError> {
    let current = match load_at(home) {
        Ok(config) => config,
        Err(ConfigError::ConfigNotFound { .. }) => {
            let root = patch.vault_root.clone().ok_or(ConfigError::MissingVaultRoot)?;
            SyncConfig::new(root)?
        }
        Err(err) => return Err(err),
    };
    let next = current.apply(patch)?;
    save_at(home, &next)?;
    Ok(next)
}

/// `update_at` convenience wrapper.
pub fn update(patch: &ConfigPatch) -> Result<SyncConfig, ConfigError> {
    update_at(&home()?, patch)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Resolve the user's home directory.
pub fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
