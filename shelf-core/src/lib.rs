//! Shelf core library: domain types, record store, sync configuration, errors.
//!
//! - [`types`]: records, patches, config enums and [`SyncConfig`]
//! - [`store`]: the [`RecordStore`] trait and the JSON-file implementation
//! - [`config`]: load / save / update of `~/.shelf/config.yaml`
//! - [`error`]: [`ConfigError`], [`StoreError`]

pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use error::{ConfigError, StoreError};
pub use store::{JsonRecordStore, RecordStore};
pub use types::{
    ConfigPatch, ConflictPolicy, Field, Highlight, LayoutMode, Record, RecordId, RecordPatch,
    SyncConfig, SyncDirection, TemplateKind,
};
