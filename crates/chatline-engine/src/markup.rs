//! Inline message formatting.
//!
//! Message text supports four ad hoc transforms: `**bold**`, `*italic*`,
//! `[label](url)` links and `- ` bullets at the start of a line. Literal
//! newlines become visual line breaks.
//!
//! Text is parsed into a small [`Markup`] tree instead of being rewritten
//! into markup strings. Renderers walk the tree, so literal text is always
//! escaped and a reply can never inject elements of its own.

use regex::Regex;
use std::sync::OnceLock;

/// Glyph rendered in place of a leading `- ` marker.
pub const BULLET_GLYPH: &str = "• ";

/// Bold is the first alternative so that, at any position, `**` wins over a
/// single `*`. Italic content may not start or end with whitespace, and the
/// only stars it may contain are complete `**...**` runs, so the stars of a
/// bold span never pair up as italic delimiters while bold inside italics
/// still works.
const INLINE_PATTERN: &str = concat!(
    r"\*\*(?P<strong>.+?)\*\*",
    r"|\[(?P<label>[^\]]+)\]\((?P<href>[^()\s]+)\)",
    r"|\*(?P<em>",
    r"(?:[^*\s]|\*\*[^*]+\*\*)",
    r"(?:(?:[^*]|\*\*[^*]+\*\*)*(?:[^*\s]|\*\*[^*]+\*\*))?",
    r")\*",
);

/// Link targets that are turned into hyperlinks. Anything else stays text.
const LINK_SCHEMES: [&str; 3] = ["http://", "https://", "mailto:"];

fn inline_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(INLINE_PATTERN).expect("inline pattern is valid"))
}

/// An inline element of a formatted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Literal text. Never interpreted as markup by any renderer.
    Text(String),
    /// Strongly emphasized content (`**x**`).
    Strong(Vec<Inline>),
    /// Emphasized content (`*x*`).
    Emphasis(Vec<Inline>),
    /// Outbound hyperlink (`[label](href)`), opened in a new browsing context.
    Link { label: String, href: String },
}

/// One visual line of a formatted message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupLine {
    /// Whether the line started with a `- ` bullet marker.
    pub bullet: bool,
    /// Inline content, marker removed.
    pub inlines: Vec<Inline>,
}

/// A formatted message: lines separated by visual breaks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup {
    pub lines: Vec<MarkupLine>,
}

/// Parse message text into a [`Markup`] tree.
///
/// Markers never span lines. Unmatched markers are kept as literal text.
pub fn format_text(text: &str) -> Markup {
    let lines = text
        .split('\n')
        .map(|line| parse_line(line.strip_suffix('\r').unwrap_or(line)))
        .collect();
    Markup { lines }
}

fn parse_line(line: &str) -> MarkupLine {
    match line.strip_prefix("- ") {
        Some(rest) => MarkupLine {
            bullet: true,
            inlines: parse_inlines(rest),
        },
        None => MarkupLine {
            bullet: false,
            inlines: parse_inlines(line),
        },
    }
}

fn parse_inlines(input: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    let mut last = 0;

    for caps in inline_pattern().captures_iter(input) {
        let Some(whole) = caps.get(0) else { continue };
        push_text(&mut inlines, &input[last..whole.start()]);
        last = whole.end();

        if let Some(strong) = caps.name("strong") {
            inlines.push(Inline::Strong(parse_inlines(strong.as_str())));
        } else if let Some(em) = caps.name("em") {
            inlines.push(Inline::Emphasis(parse_inlines(em.as_str())));
        } else if let (Some(label), Some(href)) = (caps.name("label"), caps.name("href")) {
            if is_link_target(href.as_str()) {
                inlines.push(Inline::Link {
                    label: label.as_str().to_string(),
                    href: href.as_str().to_string(),
                });
            } else {
                push_text(&mut inlines, whole.as_str());
            }
        }
    }

    push_text(&mut inlines, &input[last..]);
    inlines
}

/// Append text, merging with a preceding text node.
fn push_text(inlines: &mut Vec<Inline>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Inline::Text(prev)) = inlines.last_mut() {
        prev.push_str(text);
    } else {
        inlines.push(Inline::Text(text.to_string()));
    }
}

fn is_link_target(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    LINK_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

impl Markup {
    /// Render as an HTML fragment.
    ///
    /// All literal text and attribute values are escaped; the only elements
    /// emitted are `strong`, `em`, `a` and `br`.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                html.push_str("<br>");
            }
            if line.bullet {
                html.push_str(BULLET_GLYPH);
            }
            write_inlines_html(&mut html, &line.inlines);
        }
        html
    }

    /// The visible text, without any styling.
    pub fn to_plain_text(&self) -> String {
        let mut text = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                text.push('\n');
            }
            if line.bullet {
                text.push_str(BULLET_GLYPH);
            }
            write_inlines_plain(&mut text, &line.inlines);
        }
        text
    }
}

fn write_inlines_html(html: &mut String, inlines: &[Inline]) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => escape_html_into(html, text),
            Inline::Strong(children) => {
                html.push_str("<strong>");
                write_inlines_html(html, children);
                html.push_str("</strong>");
            }
            Inline::Emphasis(children) => {
                html.push_str("<em>");
                write_inlines_html(html, children);
                html.push_str("</em>");
            }
            Inline::Link { label, href } => {
                html.push_str("<a href=\"");
                escape_html_into(html, href);
                html.push_str("\" target=\"_blank\" rel=\"noopener noreferrer\">");
                escape_html_into(html, label);
                html.push_str("</a>");
            }
        }
    }
}

fn write_inlines_plain(text: &mut String, inlines: &[Inline]) {
    for inline in inlines {
        match inline {
            Inline::Text(t) => text.push_str(t),
            Inline::Strong(children) | Inline::Emphasis(children) => {
                write_inlines_plain(text, children);
            }
            Inline::Link { label, .. } => text.push_str(label),
        }
    }
}

/// Escape text for use in HTML element content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_html_into(&mut out, text);
    out
}

fn escape_html_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}
