//! # shelf-vault
//!
//! Everything that touches the vault directory tree directly:
//!
//! - [`scanner`]: find `.md` documents and load text + mtime
//! - [`metadata`]: front matter and `## My Notes` extraction
//! - [`layout`]: file naming and folder placement
//! - [`writer`]: atomic, hash-gated document writes

pub mod error;
pub mod layout;
pub mod metadata;
pub mod scanner;
pub mod writer;

pub use error::VaultError;
pub use metadata::{classify, parse, ManagedDocument, MetaValue, Metadata, Parsed};
pub use scanner::{scan, VaultDocument};
pub use writer::{write_document, WriteResult};
