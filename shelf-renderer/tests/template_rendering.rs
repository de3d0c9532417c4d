use chrono::{TimeZone, Utc};
use rstest::rstest;
use shelf_core::types::{Record, TemplateKind};
use shelf_renderer::{html_to_markdown, Renderer};
use tempfile::TempDir;

fn make_record() -> Record {
    let mut record = Record::new("42", "https://example.com/post", "Rust Ownership");
    record.domain = Some("example.com".into());
    record.author = Some("Ferris".into());
    record.excerpt = Some("Borrowing, explained.".into());
    record.tags = vec!["rust".into(), "systems".into()];
    record.content = Some("<h2>Intro</h2><p>Hello &amp; welcome</p>".into());
    record.notes = Some("My note".into());
    record.is_read = true;
    record.created_at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    record
}

fn front_matter(doc: &str) -> &str {
    let rest = doc.strip_prefix("---\n").expect("document opens with ---");
    let end = rest.find("\n---\n").expect("front matter is closed");
    &rest[..end]
}

#[rstest]
#[case(TemplateKind::Minimal)]
#[case(TemplateKind::Default)]
#[case(TemplateKind::Detailed)]
fn every_template_carries_machine_readable_front_matter(#[case] kind: TemplateKind) {
    let renderer = Renderer::new().unwrap();
    let doc = renderer.render(&make_record(), kind).unwrap();
    let fm = front_matter(&doc);
    let lines: Vec<&str> = fm.lines().collect();
    assert!(lines.contains(&"record_id: 42"), "{kind}: {fm}");
    assert!(lines.contains(&"url: https://example.com/post"), "{kind}: {fm}");
    assert!(lines.contains(&"title: \"Rust Ownership\""), "{kind}: {fm}");
    assert!(lines.contains(&"domain: example.com"), "{kind}: {fm}");
    assert!(lines.contains(&"read: true"), "{kind}: {fm}");
    assert!(lines.contains(&"favorite: false"), "{kind}: {fm}");
    assert!(lines.contains(&"archived: false"), "{kind}: {fm}");
    assert!(lines.contains(&"created: 2024-05-01"), "{kind}: {fm}");
    assert!(lines.iter().any(|l| l.starts_with("progress: ")), "{kind}: {fm}");
}

#[rstest]
#[case(TemplateKind::Minimal)]
#[case(TemplateKind::Default)]
#[case(TemplateKind::Detailed)]
fn every_template_ends_notes_section_with_record_notes(#[case] kind: TemplateKind) {
    let renderer = Renderer::new().unwrap();
    let doc = renderer.render(&make_record(), kind).unwrap();
    assert!(doc.contains("## My Notes\n\nMy note\n<!-- end of notes -->"), "{kind}:\n{doc}");
}

#[test]
fn notes_with_their_own_headings_stay_inside_the_marker() {
    let renderer = Renderer::new().unwrap();
    let mut record = make_record();
    record.notes = Some("intro\n\n## Part two\nmore".into());
    let doc = renderer.render(&record, TemplateKind::Detailed).unwrap();
    let notes_at = doc.find("## My Notes\n").unwrap();
    let end_at = doc.find("<!-- end of notes -->").unwrap();
    assert!(doc[notes_at..end_at].contains("## Part two\nmore\n"), "{doc}");
    assert!(doc.find("## Related Articles").unwrap() > end_at, "{doc}");
}

#[test]
fn default_template_interpolates_tags_and_body() {
    let renderer = Renderer::new().unwrap();
    let doc = renderer.render(&make_record(), TemplateKind::Default).unwrap();
    assert!(doc.contains("# Rust Ownership\n"));
    assert!(doc.contains("> Borrowing, explained."));
    assert!(doc.contains("**Source:** [example.com](https://example.com/post)"));
    assert!(doc.contains("**Saved:** May 1, 2024"));
    assert!(doc.contains("**Tags:** #rust #systems"));
    assert!(doc.contains("## Intro\n\nHello & welcome"));
    assert!(!doc.contains("**Reading time:**"));
    assert!(doc.ends_with("My note\n"));
}

#[test]
fn minimal_template_omits_source_block() {
    let renderer = Renderer::new().unwrap();
    let doc = renderer.render(&make_record(), TemplateKind::Minimal).unwrap();
    assert!(doc.contains("<https://example.com/post>"));
    assert!(doc.contains("#rust #systems"));
    assert!(!doc.contains("**Source:**"));
    assert!(!doc.contains("**Author:**"));
}

#[test]
fn detailed_template_adds_author_status_and_placeholders() {
    let renderer = Renderer::new().unwrap();
    let mut record = make_record();
    record.is_favorite = true;
    let doc = renderer.render(&record, TemplateKind::Detailed).unwrap();
    assert!(doc.contains("**Author:** Ferris"));
    assert!(doc.contains("**Reading time:** 1 min"));
    assert!(doc.contains("**Status:** ✅ Read · ⭐ Favorite"));
    assert!(doc.contains("## Summary"));
    assert!(doc.contains("## Related Articles"));
    assert!(doc.contains("## Action Items\n\n- [ ] Review key takeaways"));
}

#[test]
fn detailed_template_without_content_shows_placeholder() {
    let renderer = Renderer::new().unwrap();
    let mut record = make_record();
    record.content = None;
    let doc = renderer.render(&record, TemplateKind::Detailed).unwrap();
    assert!(doc.contains("_No content saved._"));
}

#[test]
fn empty_notes_render_bare_heading() {
    let renderer = Renderer::new().unwrap();
    let mut record = make_record();
    record.notes = None;
    let doc = renderer.render(&record, TemplateKind::Default).unwrap();
    assert!(doc.trim_end().ends_with("## My Notes\n<!-- end of notes -->"), "{doc}");
}

#[test]
fn rendering_is_deterministic() {
    let renderer = Renderer::new().unwrap();
    let record = make_record();
    for kind in TemplateKind::all() {
        assert_eq!(
            renderer.render(&record, *kind).unwrap(),
            renderer.render(&record, *kind).unwrap()
        );
    }
}

#[test]
fn override_partial_applies_to_every_template() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("shared")).unwrap();
    std::fs::write(
        dir.path().join("shared/_notes.tera"),
        "## My Notes\n\n(custom) {{ record.notes }}\n",
    )
    .unwrap();
    let renderer = Renderer::with_template_dir(dir.path()).unwrap();
    for kind in TemplateKind::all() {
        let doc = renderer.render(&make_record(), *kind).unwrap();
        assert!(doc.contains("(custom) My note"), "{kind}");
    }
}

#[test]
fn transcoder_handles_a_realistic_article() {
    let html = r#"<article>
<h1>Title</h1>
<p>Intro with <a href="https://a.dev">a link</a> and <code>code</code>.</p>
<pre><code class="language-rust">let x = 1;</code></pre>
<ul><li>first</li><li>second</li></ul>
</article>"#;
    let md = html_to_markdown(html);
    assert!(md.starts_with("# Title"));
    assert!(md.contains("Intro with [a link](https://a.dev) and `code`."));
    assert!(md.contains("```\nlet x = 1;\n```"));
    assert!(md.contains("- first\n- second"));
    assert!(!md.contains('<'));
    assert!(!md.contains("\n\n\n"));
}
