//! Domain types for the reading list and its vault mirror.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! All types are serializable/deserializable via serde (JSON for the record
//! store, YAML for the sync configuration).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed identifier for a saved article.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Config enums
// ---------------------------------------------------------------------------

/// How exported files are grouped below the sync folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    /// `<folder>/YYYY/MM/`
    #[default]
    ByDate,
    /// `<folder>/<domain>/`
    ByDomain,
    /// `<folder>/`
    Flat,
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutMode::ByDate => write!(f, "by-date"),
            LayoutMode::ByDomain => write!(f, "by-domain"),
            LayoutMode::Flat => write!(f, "flat"),
        }
    }
}

impl FromStr for LayoutMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "by-date" | "date" => Ok(LayoutMode::ByDate),
            "by-domain" | "domain" => Ok(LayoutMode::ByDomain),
            "flat" => Ok(LayoutMode::Flat),
            other => Err(ConfigError::UnknownLayout(other.to_string())),
        }
    }
}

/// Which of the three fixed document templates to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKind {
    #[default]
    Default,
    Minimal,
    Detailed,
}

impl TemplateKind {
    /// All template variants in a stable order.
    pub fn all() -> &'static [TemplateKind] {
        &[TemplateKind::Default, TemplateKind::Minimal, TemplateKind::Detailed]
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKind::Default => write!(f, "default"),
            TemplateKind::Minimal => write!(f, "minimal"),
            TemplateKind::Detailed => write!(f, "detailed"),
        }
    }
}

impl FromStr for TemplateKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(TemplateKind::Default),
            "minimal" => Ok(TemplateKind::Minimal),
            "detailed" => Ok(TemplateKind::Detailed),
            other => Err(ConfigError::UnknownTemplate(other.to_string())),
        }
    }
}

/// Which passes a full sync runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SyncDirection {
    ExportOnly,
    ImportOnly,
    #[default]
    Both,
}

impl SyncDirection {
    pub fn exports(self) -> bool {
        matches!(self, SyncDirection::ExportOnly | SyncDirection::Both)
    }

    pub fn imports(self) -> bool {
        matches!(self, SyncDirection::ImportOnly | SyncDirection::Both)
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncDirection::ExportOnly => write!(f, "export-only"),
            SyncDirection::ImportOnly => write!(f, "import-only"),
            SyncDirection::Both => write!(f, "both"),
        }
    }
}

impl FromStr for SyncDirection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "export-only" | "export" => Ok(SyncDirection::ExportOnly),
            "import-only" | "import" => Ok(SyncDirection::ImportOnly),
            "both" | "bidirectional" => Ok(SyncDirection::Both),
            other => Err(ConfigError::UnknownDirection(other.to_string())),
        }
    }
}

/// How a detected conflict is settled.
///
/// Parsing never fails: any unrecognized value becomes [`ConflictPolicy::Manual`],
/// which declines resolution and leaves both sides untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum ConflictPolicy {
    VaultWins,
    RecordWins,
    Merge,
    #[default]
    Manual,
}

impl ConflictPolicy {
    /// Lenient parse; unknown values map to `Manual`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "vault-wins" | "vault" => ConflictPolicy::VaultWins,
            "record-wins" | "record" | "database-wins" => ConflictPolicy::RecordWins,
            "merge" => ConflictPolicy::Merge,
            _ => ConflictPolicy::Manual,
        }
    }
}

impl From<String> for ConflictPolicy {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPolicy::VaultWins => write!(f, "vault-wins"),
            ConflictPolicy::RecordWins => write!(f, "record-wins"),
            ConflictPolicy::Merge => write!(f, "merge"),
            ConflictPolicy::Manual => write!(f, "manual"),
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A record field the engine can compare or update from a vault document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    IsRead,
    IsFavorite,
    IsArchived,
    Progress,
    Notes,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::IsRead => write!(f, "is_read"),
            Field::IsFavorite => write!(f, "is_favorite"),
            Field::IsArchived => write!(f, "is_archived"),
            Field::Progress => write!(f, "progress"),
            Field::Notes => write!(f, "notes"),
        }
    }
}

/// A saved article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub url: String,
    pub title: String,
    /// Extracted article HTML.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_archived: bool,
    /// Reading progress, `0.0..=1.0`.
    #[serde(default)]
    pub progress: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_read_at: Option<DateTime<Utc>>,
    /// Location of the exported file, relative to the vault root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_path: Option<PathBuf>,
    /// Set only after a successful export write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_synced_at: Option<DateTime<Utc>>,
}

impl Record {
    /// A fresh, unread, never-exported record.
    pub fn new(id: impl Into<RecordId>, url: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Record {
            id: id.into(),
            url: url.into(),
            title: title.into(),
            content: None,
            excerpt: None,
            author: None,
            domain: None,
            tags: Vec::new(),
            notes: None,
            is_read: false,
            is_favorite: false,
            is_archived: false,
            progress: 0.0,
            created_at: now,
            updated_at: now,
            last_read_at: None,
            vault_path: None,
            vault_synced_at: None,
        }
    }

    /// Never exported, or edited after the last export.
    pub fn needs_export(&self) -> bool {
        match self.vault_synced_at {
            None => true,
            Some(synced) => self.updated_at > synced,
        }
    }

    /// Notes as compared against a vault document: trimmed, absent = empty.
    pub fn notes_text(&self) -> &str {
        self.notes.as_deref().map(str::trim).unwrap_or("")
    }

    /// Apply a partial update. Returns `true` when anything changed.
    ///
    /// `updated_at` advances only when a content field changes; sync
    /// bookkeeping alone leaves it untouched.
    pub fn apply(&mut self, patch: &RecordPatch, now: DateTime<Utc>) -> bool {
        let content_changed = patch.touches_content();
        if let Some(v) = patch.is_read {
            self.is_read = v;
        }
        if let Some(v) = patch.is_favorite {
            self.is_favorite = v;
        }
        if let Some(v) = patch.is_archived {
            self.is_archived = v;
        }
        if let Some(v) = patch.progress {
            self.progress = v.clamp(0.0, 1.0);
        }
        if let Some(notes) = &patch.notes {
            self.notes = if notes.trim().is_empty() { None } else { Some(notes.clone()) };
        }
        if let Some(v) = patch.last_read_at {
            self.last_read_at = Some(v);
        }
        if let Some(path) = &patch.vault_path {
            self.vault_path = Some(path.clone());
        }
        if let Some(v) = patch.vault_synced_at {
            self.vault_synced_at = Some(v);
        }
        if content_changed {
            self.updated_at = now;
        }
        content_changed || patch.touches_bookkeeping()
    }
}

/// A partial record used by `update_fields`. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    /// Replacement notes; an empty string clears them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_read_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_synced_at: Option<DateTime<Utc>>,
}

impl RecordPatch {
    /// Bookkeeping patch written after a successful export.
    pub fn synced(vault_path: &Path, at: DateTime<Utc>) -> Self {
        RecordPatch {
            vault_path: Some(vault_path.to_path_buf()),
            vault_synced_at: Some(at),
            ..RecordPatch::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.touches_content() && !self.touches_bookkeeping()
    }

    pub fn touches_content(&self) -> bool {
        !self.fields().is_empty() || self.last_read_at.is_some()
    }

    pub fn touches_bookkeeping(&self) -> bool {
        self.vault_path.is_some() || self.vault_synced_at.is_some()
    }

    /// Content fields set on this patch, in declaration order.
    pub fn fields(&self) -> Vec<Field> {
        let mut fields = Vec::new();
        if self.is_read.is_some() {
            fields.push(Field::IsRead);
        }
        if self.is_favorite.is_some() {
            fields.push(Field::IsFavorite);
        }
        if self.is_archived.is_some() {
            fields.push(Field::IsArchived);
        }
        if self.progress.is_some() {
            fields.push(Field::Progress);
        }
        if self.notes.is_some() {
            fields.push(Field::Notes);
        }
        fields
    }
}

/// A highlighted passage. Kept by the record store; the sync engine never reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub id: String,
    pub record_id: RecordId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// SyncConfig
// ---------------------------------------------------------------------------

fn default_folder() -> String {
    "Reading List".to_string()
}

fn default_true() -> bool {
    true
}

/// Vault sync settings. Held by a single orchestrator; persisted as YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Absolute path of the vault directory.
    pub vault_root: PathBuf,
    /// Sub-folder of the vault that receives exported documents.
    #[serde(default = "default_folder")]
    pub folder: String,
    #[serde(default)]
    pub layout: LayoutMode,
    #[serde(default)]
    pub template: TemplateKind,
    #[serde(default)]
    pub direction: SyncDirection,
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
    #[serde(default = "default_true")]
    pub backup_before_sync: bool,
    /// Directory of `.tera` files overriding the embedded templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,
}

impl SyncConfig {
    /// Config with defaults for everything but the vault root.
    pub fn new(vault_root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let config = SyncConfig {
            vault_root: vault_root.into(),
            folder: default_folder(),
            layout: LayoutMode::default(),
            template: TemplateKind::default(),
            direction: SyncDirection::default(),
            conflict_policy: ConflictPolicy::default(),
            backup_before_sync: true,
            templates_dir: None,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vault_root.as_os_str().is_empty() {
            return Err(ConfigError::MissingVaultRoot);
        }
        Ok(())
    }

    /// Directory that export writes into and import scans.
    pub fn sync_root(&self) -> PathBuf {
        self.vault_root.join(&self.folder)
    }

    /// Return an updated copy. The receiver is left untouched when the
    /// result would be invalid.
    pub fn apply(&self, patch: &ConfigPatch) -> Result<SyncConfig, ConfigError> {
        let mut next = self.clone();
        if let Some(root) = &patch.vault_root {
            next.vault_root = root.clone();
        }
        if let Some(folder) = &patch.folder {
            next.folder = folder.trim().to_string();
        }
        if let Some(layout) = patch.layout {
            next.layout = layout;
        }
        if let Some(template) = patch.template {
            next.template = template;
        }
        if let Some(direction) = patch.direction {
            next.direction = direction;
        }
        if let Some(policy) = patch.conflict_policy {
            next.conflict_policy = policy;
        }
        if let Some(backup) = patch.backup_before_sync {
            next.backup_before_sync = backup;
        }
        if let Some(dir) = &patch.templates_dir {
            // An empty path switches back to the embedded templates.
            next.templates_dir = (!dir.as_os_str().is_empty()).then(|| dir.clone());
        }
        next.validate()?;
        Ok(next)
    }
}

/// Partial [`SyncConfig`] update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPatch {
    pub vault_root: Option<PathBuf>,
    pub folder: Option<String>,
    pub layout: Option<LayoutMode>,
    pub template: Option<TemplateKind>,
    pub direction: Option<SyncDirection>,
    pub conflict_policy: Option<ConflictPolicy>,
    pub backup_before_sync: Option<bool>,
    pub templates_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn newtype_display() {
        assert_eq!(RecordId::from("r-01").to_string(), "r-01");
    }

    #[test]
    fn enum_display_matches_serde_names() {
        assert_eq!(LayoutMode::ByDomain.to_string(), "by-domain");
        assert_eq!(
            serde_yaml::to_string(&LayoutMode::ByDomain).unwrap().trim(),
            "by-domain"
        );
        assert_eq!(SyncDirection::ExportOnly.to_string(), "export-only");
        assert_eq!(ConflictPolicy::RecordWins.to_string(), "record-wins");
    }

    #[test]
    fn unknown_direction_is_a_config_error() {
        let err = "sideways".parse::<SyncDirection>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDirection(_)));
    }

    #[test]
    fn unknown_policy_falls_back_to_manual() {
        assert_eq!(ConflictPolicy::parse("coin-flip"), ConflictPolicy::Manual);
        let parsed: ConflictPolicy = serde_yaml::from_str("coin-flip").unwrap();
        assert_eq!(parsed, ConflictPolicy::Manual);
        let parsed: ConflictPolicy = serde_yaml::from_str("merge").unwrap();
        assert_eq!(parsed, ConflictPolicy::Merge);
    }

    #[test]
    fn needs_export_tracks_edits_after_sync() {
        let mut record = Record::new("1", "https://example.com", "Example");
        assert!(record.needs_export());

        record.vault_synced_at = Some(record.updated_at + Duration::seconds(1));
        assert!(!record.needs_export());

        record.updated_at = record.updated_at + Duration::seconds(5);
        assert!(record.needs_export());
    }

    #[test]
    fn bookkeeping_patch_does_not_bump_updated_at() {
        let mut record = Record::new("1", "https://example.com", "Example");
        let before = record.updated_at;
        let later = before + Duration::seconds(30);
        let changed = record.apply(&RecordPatch::synced(Path::new("a.md"), later), later);
        assert!(changed);
        assert_eq!(record.updated_at, before);
        assert_eq!(record.vault_synced_at, Some(later));
    }

    #[test]
    fn content_patch_bumps_updated_at_and_clears_blank_notes() {
        let mut record = Record::new("1", "https://example.com", "Example");
        record.notes = Some("old".into());
        let later = record.updated_at + Duration::seconds(30);
        let patch = RecordPatch {
            is_read: Some(true),
            notes: Some("  ".into()),
            ..RecordPatch::default()
        };
        record.apply(&patch, later);
        assert!(record.is_read);
        assert!(record.notes.is_none());
        assert_eq!(record.updated_at, later);
        assert_eq!(patch.fields(), vec![Field::IsRead, Field::Notes]);
    }

    #[test]
    fn config_apply_rejects_empty_vault_root() {
        let config = SyncConfig::new("/vault").unwrap();
        let patch = ConfigPatch {
            vault_root: Some(PathBuf::new()),
            direction: Some(SyncDirection::ImportOnly),
            ..ConfigPatch::default()
        };
        let err = config.apply(&patch).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVaultRoot));
        assert_eq!(config.direction, SyncDirection::Both);
    }

    #[test]
    fn config_yaml_fills_defaults() {
        let config: SyncConfig = serde_yaml::from_str("vault_root: /vault\n").unwrap();
        assert_eq!(config.folder, "Reading List");
        assert_eq!(config.layout, LayoutMode::ByDate);
        assert_eq!(config.conflict_policy, ConflictPolicy::Manual);
        assert!(config.backup_before_sync);
        assert!(config.templates_dir.is_none());
        assert_eq!(config.sync_root(), PathBuf::from("/vault/Reading List"));
    }

    #[test]
    fn templates_dir_is_set_and_cleared_by_patch() {
        let config = SyncConfig::new("/vault").unwrap();
        let set = config
            .apply(&ConfigPatch {
                templates_dir: Some(PathBuf::from("/tpl")),
                ..ConfigPatch::default()
            })
            .unwrap();
        assert_eq!(set.templates_dir, Some(PathBuf::from("/tpl")));
        assert!(serde_yaml::to_string(&set).unwrap().contains("templates_dir: /tpl"));
        assert!(!serde_yaml::to_string(&config).unwrap().contains("templates_dir"));

        let cleared = set
            .apply(&ConfigPatch {
                templates_dir: Some(PathBuf::new()),
                ..ConfigPatch::default()
            })
            .unwrap();
        assert!(cleared.templates_dir.is_none());
    }
}
