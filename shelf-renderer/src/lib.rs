//! # shelf-renderer
//!
//! Tera-based renderer that turns reading-list records into vault documents,
//! plus the HTML → Markdown transcoder used for article bodies.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use shelf_core::types::{Record, TemplateKind};
//! use shelf_renderer::Renderer;
//!
//! fn print_document(record: &Record) {
//!     if let Ok(renderer) = Renderer::new() {
//!         if let Ok(text) = renderer.render(record, TemplateKind::Default) {
//!             println!("{text}");
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod transcode;

pub use context::TemplateContext;
pub use engine::{template_name, Renderer};
pub use error::RenderError;
pub use transcode::html_to_markdown;
