//! Metadata parser.
//!
//! A managed document opens with a front-matter block:
//!
//! ```text
//! ---
//! record_id: 42
//! url: https://example.com/post
//! read: true
//! ---
//! ```
//!
//! Each line is split at the first colon, the value trimmed and unquoted,
//! then coerced to a [`MetaValue`]. Independently the `## My Notes` section
//! is extracted as free text: from the last notes heading up to the
//! [`NOTES_END`] marker the renderer writes, or up to the next second-level
//! heading in documents without one. This is a line-oriented reader, not a YAML
//! parser: nested values and lists are kept as plain text.

use std::collections::BTreeMap;
use std::fmt;

use shelf_core::types::RecordId;

/// Front-matter keys shared with the renderer's front-matter partial.
pub mod keys {
    pub const RECORD_ID: &str = "record_id";
    pub const URL: &str = "url";
    pub const TITLE: &str = "title";
    pub const DOMAIN: &str = "domain";
    pub const AUTHOR: &str = "author";
    pub const READ: &str = "read";
    pub const FAVORITE: &str = "favorite";
    pub const ARCHIVED: &str = "archived";
    pub const PROGRESS: &str = "progress";
    pub const CREATED: &str = "created";
}

const FENCE: &str = "---";
const NOTES_HEADING: &str = "## My Notes";
/// Line closing the notes section, so notes may carry their own headings.
pub const NOTES_END: &str = "<!-- end of notes -->";

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A type-coerced front-matter value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl MetaValue {
    /// `"true"`/`"false"` → bool, numeric-looking → number, else text.
    pub fn coerce(raw: &str) -> Self {
        match raw {
            "true" => return MetaValue::Bool(true),
            "false" => return MetaValue::Bool(false),
            _ => {}
        }
        if looks_numeric(raw) {
            if let Ok(n) = raw.parse::<f64>() {
                if n.is_finite() {
                    return MetaValue::Number(n);
                }
            }
        }
        MetaValue::Text(raw.to_string())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Bool(b) => write!(f, "{b}"),
            MetaValue::Number(n) => write!(f, "{n}"),
            MetaValue::Text(s) => f.write_str(s),
        }
    }
}

fn looks_numeric(raw: &str) -> bool {
    !raw.is_empty()
        && raw.chars().any(|c| c.is_ascii_digit())
        && raw
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Typed key/value mapping from a document's front matter.
///
/// The unquoted source text of every value is kept alongside the coerced
/// value so identifiers like `007` survive intact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    values: BTreeMap<String, MetaValue>,
    raw: BTreeMap<String, String>,
}

impl Metadata {
    pub fn insert(&mut self, key: impl Into<String>, raw: &str) {
        let key = key.into();
        self.values.insert(key.clone(), MetaValue::coerce(raw));
        self.raw.insert(key, raw.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.values.get(key)
    }

    /// Unquoted source text of a value.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.raw.get(key).map(String::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(MetaValue::as_bool)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(MetaValue::as_f64)
    }

    /// Non-empty source text of a value, regardless of its coerced type.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.raw(key).filter(|s| !s.is_empty())
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.get_str(keys::RECORD_ID).map(RecordId::from)
    }

    pub fn url(&self) -> Option<&str> {
        self.get_str(keys::URL)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// A document that carries both `record_id` and `url`.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagedDocument {
    pub record_id: RecordId,
    pub url: String,
    pub metadata: Metadata,
    /// Trimmed `## My Notes` section; empty when absent.
    pub notes: String,
}

/// Classification of a vault document.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Managed(ManagedDocument),
    /// Foreign content; the engine leaves it alone.
    Unmanaged,
}

/// Extract front matter and notes from `text`.
pub fn parse(text: &str) -> (Metadata, String) {
    let text = text.replace("\r\n", "\n");
    (front_matter(&text), notes_section(&text))
}

/// Parse and classify `text` as managed or foreign content.
pub fn classify(text: &str) -> Parsed {
    let (metadata, notes) = parse(text);
    match (metadata.record_id(), metadata.url().map(str::to_string)) {
        (Some(record_id), Some(url)) => Parsed::Managed(ManagedDocument {
            record_id,
            url,
            metadata,
            notes,
        }),
        _ => Parsed::Unmanaged,
    }
}

fn front_matter(text: &str) -> Metadata {
    let mut metadata = Metadata::default();
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.lines();
    if lines.next().map(str::trim_end) != Some(FENCE) {
        return metadata;
    }

    let mut closed = false;
    let mut pending = Vec::new();
    for line in lines {
        if line.trim_end() == FENCE {
            closed = true;
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        pending.push((key.to_string(), unquote(value.trim()).to_string()));
    }
    if !closed {
        return metadata;
    }
    for (key, value) in pending {
        metadata.insert(key, &value);
    }
    metadata
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn notes_section(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let end = lines.iter().rposition(|l| l.trim() == NOTES_END);

    // The article body comes first and may contain its own "My Notes" heading.
    let searched = &lines[..end.unwrap_or(lines.len())];
    let Some(heading) = searched.iter().rposition(|l| l.trim_end() == NOTES_HEADING) else {
        return String::new();
    };

    let section: Vec<&str> = match end {
        Some(end) => lines[heading + 1..end].to_vec(),
        None => lines[heading + 1..]
            .iter()
            .take_while(|l| !is_second_level_heading(l))
            .copied()
            .collect(),
    };
    section.join("\n").trim().to_string()
}

fn is_second_level_heading(line: &str) -> bool {
    line.starts_with("## ") || line.trim_end() == "##"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
