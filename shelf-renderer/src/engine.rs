//! Tera rendering engine: template selection and [`Renderer`].
//!
//! | Template   | Interpolates                                                        |
//! |------------|---------------------------------------------------------------------|
//! | `minimal`  | title, url, tags, body, notes                                       |
//! | `default`  | + excerpt, source domain, saved date                                |
//! | `detailed` | + author, reading time, status glyphs, related/action placeholders |
//!
//! Every template starts with the shared front-matter partial so the vault
//! parser can recover the record id and flags.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tera::Tera;
use walkdir::WalkDir;

use shelf_core::types::{Record, SyncConfig, TemplateKind};

use crate::context::TemplateContext;
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates: baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    (
        "shared/_frontmatter.tera",
        include_str!("templates/_partials/frontmatter.tera"),
    ),
    ("shared/_notes.tera", include_str!("templates/_partials/notes.tera")),
    ("default.md.tera", include_str!("templates/default.md.tera")),
    ("minimal.md.tera", include_str!("templates/minimal.md.tera")),
    ("detailed.md.tera", include_str!("templates/detailed.md.tera")),
];

const TEMPLATE_EXTENSION: &str = "tera";

/// Registered template name for a [`TemplateKind`].
pub fn template_name(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::Default => "default.md.tera",
        TemplateKind::Minimal => "minimal.md.tera",
        TemplateKind::Detailed => "detailed.md.tera",
    }
}

// ---------------------------------------------------------------------------
// Template sources
// ---------------------------------------------------------------------------

/// Every `.tera` file below `dir`, named by its `/`-separated path relative
/// to `dir` (`shared/_notes.tera`). A missing or unreadable directory is an
/// error: an explicitly configured template set must be there.
fn templates_in(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| RenderError::Io {
            path: err.path().unwrap_or(dir).to_path_buf(),
            source: err.into(),
        })?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION)
        {
            continue;
        }
        let Ok(relative) = path.strip_prefix(dir) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let body = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        found.push((name, body));
    }
    Ok(found)
}

fn compile(overrides: Option<&Path>) -> Result<Tera, RenderError> {
    let mut sources: BTreeMap<String, String> = TPLS
        .iter()
        .map(|(name, body)| (name.to_string(), body.to_string()))
        .collect();
    if let Some(dir) = overrides {
        sources.extend(templates_in(dir)?);
    }

    let mut tera = Tera::default();
    // Markdown output: nothing is HTML-escaped.
    tera.autoescape_on(vec![]);
    tera.add_raw_templates(sources)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders records into vault documents.
///
/// Create once and reuse; rendering is pure. Files in a template directory
/// replace the embedded template or partial of the same name
/// (`default.md.tera`, `shared/_notes.tera`, ...).
#[derive(Debug)]
pub struct Renderer {
    tera: Tera,
    template_dir: Option<PathBuf>,
}

impl Renderer {
    /// Construct a new [`Renderer`] with embedded templates.
    pub fn new() -> Result<Self, RenderError> {
        Ok(Renderer { tera: compile(None)?, template_dir: None })
    }

    /// Construct a [`Renderer`] whose templates may be overridden from `dir`.
    pub fn with_template_dir(dir: &Path) -> Result<Self, RenderError> {
        Ok(Renderer {
            tera: compile(Some(dir))?,
            template_dir: Some(dir.to_path_buf()),
        })
    }

    /// The renderer a sync config asks for: embedded templates, overridden
    /// from `templates_dir` when one is set.
    pub fn for_config(config: &SyncConfig) -> Result<Self, RenderError> {
        match &config.templates_dir {
            Some(dir) => Self::with_template_dir(dir),
            None => Self::new(),
        }
    }

    /// Override directory this renderer was built from, if any.
    pub fn template_dir(&self) -> Option<&Path> {
        self.template_dir.as_deref()
    }

    /// Render `record` with the chosen template.
    pub fn render(&self, record: &Record, kind: TemplateKind) -> Result<String, RenderError> {
        let ctx = TemplateContext::from_record(record, kind);
        self.render_with_context(&ctx, kind)
    }

    /// Render using a caller-provided [`TemplateContext`]. Output uses LF
    /// line endings and must open with the front-matter block.
    pub fn render_with_context(
        &self,
        ctx: &TemplateContext,
        kind: TemplateKind,
    ) -> Result<String, RenderError> {
        let name = template_name(kind);
        let content = self
            .tera
            .render(name, &ctx.to_tera_context()?)?
            .replace("\r\n", "\n");
        if !content.starts_with("---\n") {
            return Err(RenderError::MissingFrontMatter { template: name.to_string() });
        }
        Ok(content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record() -> Record {
        let mut record = Record::new("7", "https://example.com/a", "Seven");
        record.domain = Some("example.com".into());
        record
    }

    #[test]
    fn renderer_new_succeeds() {
        Renderer::new().expect("Renderer::new should succeed with embedded templates");
    }

    #[test]
    fn all_templates_render_without_error() {
        let renderer = Renderer::new().unwrap();
        let record = make_record();
        for kind in TemplateKind::all() {
            let content = renderer
                .render(&record, *kind)
                .unwrap_or_else(|e| panic!("render failed for {kind:?}: {e}"));
            assert!(content.starts_with("---\n"), "{kind:?} must open with front matter");
            assert!(content.contains("# Seven"), "{kind:?} must contain the title");
            assert!(content.contains("## My Notes"), "{kind:?} must contain the notes section");
        }
    }

    #[test]
    fn no_crlf_in_any_rendered_output() {
        let renderer = Renderer::new().unwrap();
        let mut record = make_record();
        record.content = Some("<p>a\r\nb</p>".into());
        record.notes = Some("line1\r\nline2".into());
        for kind in TemplateKind::all() {
            let content = renderer.render(&record, *kind).unwrap();
            assert!(!content.contains('\r'), "{kind:?} output contains CR");
        }
    }

    #[test]
    fn user_template_overrides_embedded_default() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("minimal.md.tera"),
            "{% include \"shared/_frontmatter.tera\" %}\ncustom {{ record.id }}\n",
        )
        .unwrap();
        let renderer = Renderer::with_template_dir(dir.path()).unwrap();
        let content = renderer.render(&make_record(), TemplateKind::Minimal).unwrap();
        assert!(content.starts_with("---\nrecord_id: 7\n"));
        assert!(content.ends_with("---\n\ncustom 7\n"));
    }

    #[test]
    fn missing_template_dir_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Renderer::with_template_dir(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
    }

    #[test]
    fn config_without_template_dir_uses_embedded_templates() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = SyncConfig::new(dir.path()).unwrap();
        assert!(Renderer::for_config(&config).unwrap().template_dir().is_none());

        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        config.templates_dir = Some(dir.path().to_path_buf());
        let renderer = Renderer::for_config(&config).unwrap();
        assert_eq!(renderer.template_dir(), Some(dir.path()));
        assert!(renderer.render(&make_record(), TemplateKind::Default).is_ok());
    }

    #[test]
    fn override_without_front_matter_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("minimal.md.tera"), "custom {{ record.id }}\n").unwrap();
        let renderer = Renderer::with_template_dir(dir.path()).unwrap();
        let err = renderer.render(&make_record(), TemplateKind::Minimal).unwrap_err();
        assert!(matches!(err, RenderError::MissingFrontMatter { .. }));
    }
}
