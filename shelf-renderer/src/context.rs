//! Template context: serializable rendering payload built from a [`Record`].

use serde::{Deserialize, Serialize};

use shelf_core::types::{Record, TemplateKind};

use crate::error::RenderError;
use crate::transcode::html_to_markdown;

/// Words per minute used for the reading-time estimate.
pub const WORDS_PER_MINUTE: usize = 200;

/// Rendering payload shared by every template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateContext {
    pub record: RecordCtx,
    /// Article body, already transcoded to Markdown.
    pub body: String,
    pub reading_time_minutes: usize,
    pub status: StatusCtx,
    pub meta: MetaCtx,
}

/// Record fields as the templates see them. Single-line fields are flattened
/// so they cannot break the front-matter block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordCtx {
    pub id: String,
    pub url: String,
    pub title: String,
    pub domain: Option<String>,
    pub author: Option<String>,
    pub excerpt: Option<String>,
    pub tags: Vec<String>,
    /// `#a #b #c`
    pub tags_line: String,
    pub notes: String,
    pub is_read: bool,
    pub is_favorite: bool,
    pub is_archived: bool,
    pub progress: f64,
    /// `YYYY-MM-DD`
    pub created_date: String,
    /// Human form of the creation date, e.g. `May 1, 2024`.
    pub created_human: String,
}

/// Glyphs for the detailed template's status line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCtx {
    pub read: String,
    pub favorite: String,
    pub line: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaCtx {
    pub shelf_version: String,
    pub template: String,
}

impl TemplateContext {
    /// Build a [`TemplateContext`] from a [`Record`].
    pub fn from_record(record: &Record, template: TemplateKind) -> Self {
        let body = record
            .content
            .as_deref()
            .map(html_to_markdown)
            .unwrap_or_default();
        let reading_time_minutes = reading_time_minutes(&body);

        let read = if record.is_read { "✅ Read" } else { "📖 Unread" }.to_string();
        let favorite = if record.is_favorite { "⭐ Favorite" } else { "" }.to_string();
        let line = [read.as_str(), favorite.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" · ");

        TemplateContext {
            record: RecordCtx {
                id: single_line(&record.id.0),
                url: single_line(&record.url),
                title: single_line(&record.title),
                domain: record.domain.as_deref().map(single_line),
                author: record.author.as_deref().map(single_line),
                excerpt: record.excerpt.as_deref().map(single_line),
                tags: record.tags.clone(),
                tags_line: tags_line(&record.tags),
                notes: record.notes_text().to_string(),
                is_read: record.is_read,
                is_favorite: record.is_favorite,
                is_archived: record.is_archived,
                progress: record.progress,
                created_date: record.created_at.format("%Y-%m-%d").to_string(),
                created_human: record.created_at.format("%B %-d, %Y").to_string(),
            },
            body,
            reading_time_minutes,
            status: StatusCtx { read, favorite, line },
            meta: MetaCtx {
                shelf_version: env!("CARGO_PKG_VERSION").to_string(),
                template: template.to_string(),
            },
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

/// `["rust", "web dev"]` → `#rust #web-dev`
pub fn tags_line(tags: &[String]) -> String {
    tags.iter()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join("-"))
        .filter(|t| !t.is_empty())
        .map(|t| format!("#{t}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// ceil(words / 200), at least one minute.
pub fn reading_time_minutes(text: &str) -> usize {
    let words = text.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
