//! Formatted message to ratatui Lines.

use chatline_engine::{Inline, Markup, BULLET_GLYPH};
use ratatui::{
    style::Style,
    text::{Line, Span},
};

use super::styles::MarkupStyles;

/// Render a formatted message, one Line per markup line.
///
/// Nested inline styles are patched over their parent, so italic inside
/// bold stays both. Links render as the label followed by the target.
pub fn render_markup(markup: &Markup, styles: &MarkupStyles) -> Vec<Line<'static>> {
    markup
        .lines
        .iter()
        .map(|line| {
            let mut spans = Vec::new();
            if line.bullet {
                spans.push(Span::styled(BULLET_GLYPH, styles.list_marker));
            }
            push_inlines(&mut spans, &line.inlines, styles.text, styles);
            Line::from(spans)
        })
        .collect()
}

fn push_inlines(
    spans: &mut Vec<Span<'static>>,
    inlines: &[Inline],
    style: Style,
    styles: &MarkupStyles,
) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => spans.push(Span::styled(text.clone(), style)),
            Inline::Strong(children) => {
                push_inlines(spans, children, style.patch(styles.strong), styles);
            }
            Inline::Emphasis(children) => {
                push_inlines(spans, children, style.patch(styles.emphasis), styles);
            }
            Inline::Link { label, href } => {
                spans.push(Span::styled(label.clone(), style.patch(styles.link)));
                spans.push(Span::styled(format!(" ({href})"), styles.link_target));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatline_engine::format_text;
    use ratatui::style::Modifier;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_plain_text() {
        let lines = render_markup(&format_text("Hello, world!"), &MarkupStyles::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "Hello, world!");
    }

    #[test]
    fn test_line_breaks() {
        let lines = render_markup(&format_text("one\n\ntwo"), &MarkupStyles::default());
        assert_eq!(lines.len(), 3);
        assert_eq!(line_text(&lines[1]), "");
    }

    #[test]
    fn test_bold_and_italic_modifiers() {
        let styles = MarkupStyles::default();
        let lines = render_markup(&format_text("**a** *b*"), &styles);
        let spans = &lines[0].spans;

        assert_eq!(spans[0].content, "a");
        assert!(spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(spans[1].content, " ");
        assert_eq!(spans[2].content, "b");
        assert!(spans[2].style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_nested_styles_combine() {
        let lines = render_markup(&format_text("**x *y* z**"), &MarkupStyles::default());
        let y = lines[0].spans.iter().find(|s| s.content == "y").unwrap();
        assert!(y.style.add_modifier.contains(Modifier::BOLD));
        assert!(y.style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_link_shows_target() {
        let lines = render_markup(
            &format_text("[docs](https://docs.rs)"),
            &MarkupStyles::default(),
        );
        assert_eq!(line_text(&lines[0]), "docs (https://docs.rs)");
        assert!(lines[0].spans[0]
            .style
            .add_modifier
            .contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_bullet_glyph() {
        let lines = render_markup(&format_text("- item"), &MarkupStyles::default());
        assert_eq!(line_text(&lines[0]), "• item");
    }
}
