//! HTML → Markdown transcoder.
//!
//! Conversion is a pipeline over an ordered rule table. Each [`Rule`] is a
//! regex and a replacement applied to the whole document before the next rule
//! runs, so the order of [`rules()`] is part of the output contract:
//!
//! 1. fenced code blocks (`<pre>`): before inline `<code>` so the block wins
//! 2. headings `h1`–`h6`
//! 3. paragraphs, line breaks
//! 4. bold, italic, inline code
//! 5. images, then hyperlinks (an image inside a link keeps both)
//! 6. list items and list containers, blockquotes
//!
//! After the table: strip remaining tags, decode entities, collapse blank runs.

use std::sync::LazyLock;

use regex::Regex;

/// One substitution step of the pipeline.
#[derive(Debug)]
pub struct Rule {
    pub name: &'static str,
    pub pattern: Regex,
    pub replacement: String,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, replacement: impl Into<String>) -> Self {
        Rule {
            name,
            pattern: Regex::new(pattern).expect("invalid transcoder rule"),
            replacement: replacement.into(),
        }
    }

    fn apply(&self, input: &str) -> String {
        self.pattern
            .replace_all(input, self.replacement.as_str())
            .into_owned()
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    let mut rules = vec![
        Rule::new(
            "pre_code",
            r"(?is)<pre(?:\s[^>]*)?>\s*<code(?:\s[^>]*)?>(.*?)</code>\s*</pre>",
            "\n```\n${1}\n```\n",
        ),
        Rule::new("pre", r"(?is)<pre(?:\s[^>]*)?>(.*?)</pre>", "\n```\n${1}\n```\n"),
    ];
    for level in 1..=6 {
        rules.push(Rule::new(
            "heading",
            &format!(r"(?is)<h{level}(?:\s[^>]*)?>(.*?)</h{level}>"),
            format!("\n{} ${{1}}\n", "#".repeat(level)),
        ));
    }
    rules.extend([
        Rule::new("paragraph", r"(?is)<p(?:\s[^>]*)?>(.*?)</p>", "\n\n${1}\n\n"),
        Rule::new("line_break", r"(?i)<br\s*/?>", "\n"),
        Rule::new(
            "bold",
            r"(?is)<(?:strong|b)(?:\s[^>]*)?>(.*?)</(?:strong|b)>",
            "**${1}**",
        ),
        Rule::new("italic", r"(?is)<(?:em|i)(?:\s[^>]*)?>(.*?)</(?:em|i)>", "*${1}*"),
        Rule::new("inline_code", r"(?is)<code(?:\s[^>]*)?>(.*?)</code>", "`${1}`"),
        Rule::new(
            "image_alt_first",
            r#"(?is)<img\s[^>]*?alt\s*=\s*["']([^"']*)["'][^>]*?src\s*=\s*["']([^"']*)["'][^>]*>"#,
            "![${1}](${2})",
        ),
        Rule::new(
            "image_src_first",
            r#"(?is)<img\s[^>]*?src\s*=\s*["']([^"']*)["'][^>]*?alt\s*=\s*["']([^"']*)["'][^>]*>"#,
            "![${2}](${1})",
        ),
        Rule::new(
            "link",
            r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a>"#,
            "[${2}](${1})",
        ),
        Rule::new("list_item", r"(?is)<li(?:\s[^>]*)?>(.*?)</li>", "- ${1}\n"),
        Rule::new("list", r"(?i)</?(?:ul|ol)(?:\s[^>]*)?>", "\n"),
        Rule::new(
            "blockquote",
            r"(?is)<blockquote(?:\s[^>]*)?>\s*(.*?)\s*</blockquote>",
            "\n> ${1}\n",
        ),
    ]);
    rules
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("invalid tag regex"));

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("invalid blank-run regex"));

/// `&amp;` is decoded last so `&amp;lt;` stays `&lt;`.
const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&amp;", "&"),
];

/// The ordered substitution table.
pub fn rules() -> &'static [Rule] {
    &RULES
}

/// Convert article HTML to Markdown.
pub fn html_to_markdown(html: &str) -> String {
    let mut text = html.replace("\r\n", "\n");
    for rule in rules() {
        text = rule.apply(&text);
    }
    text = ANY_TAG.replace_all(&text, "").into_owned();
    for (entity, decoded) in ENTITIES {
        text = text.replace(entity, decoded);
    }
    text = BLANK_RUN.replace_all(&text, "\n\n").into_owned();
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_order_is_stable() {
        let names: Vec<&str> = rules().iter().map(|r| r.name).collect();
        let pos = |name: &str| names.iter().position(|n| *n == name).unwrap();
        assert!(pos("pre_code") < pos("inline_code"));
        assert!(pos("heading") < pos("paragraph"));
        assert!(pos("image_alt_first") < pos("link"));
        assert_eq!(names.iter().filter(|n| **n == "heading").count(), 6);
    }

    #[test]
    fn headings_map_to_hash_levels() {
        assert_eq!(html_to_markdown("<h1>Top</h1>"), "# Top");
        assert_eq!(html_to_markdown("<h3 class=\"x\">Mid</h3>"), "### Mid");
        assert_eq!(html_to_markdown("<h6>Low</h6>"), "###### Low");
    }

    #[test]
    fn inline_markup() {
        assert_eq!(
            html_to_markdown("<p><strong>bold</strong> <em>it</em> <code>x()</code></p>"),
            "**bold** *it* `x()`"
        );
        assert_eq!(html_to_markdown("<b>b</b><br/><i>i</i>"), "**b**\n*i*");
    }

    #[test]
    fn pre_code_becomes_fenced_block() {
        let md = html_to_markdown("<pre><code>fn main() {}</code></pre>");
        assert_eq!(md, "```\nfn main() {}\n```");
    }

    #[test]
    fn links_and_images_keep_target_label_and_alt() {
        assert_eq!(
            html_to_markdown(r#"<a href="https://x.dev" rel="nofollow">X</a>"#),
            "[X](https://x.dev)"
        );
        assert_eq!(
            html_to_markdown(r#"<img src="/a.png" alt="A chart">"#),
            "![A chart](/a.png)"
        );
        assert_eq!(
            html_to_markdown(r#"<img alt="B" class="c" src="/b.png" />"#),
            "![B](/b.png)"
        );
    }

    #[test]
    fn lists_and_blockquotes() {
        let md = html_to_markdown("<ul><li>one</li><li>two</li></ul><ol><li>three</li></ol>");
        assert_eq!(md, "- one\n- two\n\n- three");
        assert_eq!(html_to_markdown("<blockquote><p>wise</p></blockquote>"), "> wise");
    }

    #[test]
    fn bold_rule_does_not_eat_br_or_blockquote() {
        let md = html_to_markdown("a<br>b<blockquote>c</blockquote>");
        assert_eq!(md, "a\nb\n> c");
    }

    #[test]
    fn strips_unknown_tags_and_decodes_entities() {
        let md = html_to_markdown(
            "<div><span>Tom &amp; Jerry&nbsp;&lt;3 &quot;hi&quot; it&#39;s</span></div>",
        );
        assert_eq!(md, "Tom & Jerry <3 \"hi\" it's");
        assert_eq!(html_to_markdown("&amp;lt;"), "&lt;");
    }

    #[test]
    fn collapses_blank_runs_to_one_blank_line() {
        let md = html_to_markdown("<p>a</p>\n\n\n\n<p>b</p>");
        assert_eq!(md, "a\n\nb");
        assert!(!md.contains("\n\n\n"));
    }

    #[test]
    fn deterministic_for_identical_input() {
        let html = "<h2>T</h2><p>Body <a href='/x'>link</a></p>";
        assert_eq!(html_to_markdown(html), html_to_markdown(html));
    }
}
