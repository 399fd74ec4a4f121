//! Word wrapping for styled ratatui Lines.

use ratatui::{
    style::Style,
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

/// Wrap each line to `width` columns, preserving span styles.
///
/// A width of zero leaves the lines untouched.
pub fn wrap_lines(lines: Vec<Line<'static>>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return lines;
    }
    lines
        .into_iter()
        .flat_map(|line| wrap_line(line, width))
        .collect()
}

fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    let plain: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
    if plain.width() <= width {
        return vec![line];
    }

    let styled: Vec<(char, Style)> = line
        .spans
        .iter()
        .flat_map(|span| span.content.chars().map(move |ch| (ch, span.style)))
        .collect();

    // textwrap decides the break points on the plain text; walk the styled
    // characters alongside, skipping whitespace it dropped at each break.
    let mut wrapped = Vec::new();
    let mut pos = 0;
    for piece in textwrap::wrap(&plain, width) {
        while pos < styled.len()
            && styled[pos].0.is_whitespace()
            && !piece.starts_with(styled[pos].0)
        {
            pos += 1;
        }
        let end = (pos + piece.chars().count()).min(styled.len());
        wrapped.push(Line::from(group_spans(&styled[pos..end])));
        pos = end;
    }

    if wrapped.is_empty() {
        wrapped.push(Line::default());
    }
    wrapped
}

/// Merge consecutive characters of equal style into spans.
fn group_spans(chars: &[(char, Style)]) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut text = String::new();
    let mut current: Option<Style> = None;

    for &(ch, style) in chars {
        if let Some(prev) = current {
            if prev != style && !text.is_empty() {
                spans.push(Span::styled(std::mem::take(&mut text), prev));
            }
        }
        current = Some(style);
        text.push(ch);
    }

    if let Some(style) = current {
        if !text.is_empty() {
            spans.push(Span::styled(text, style));
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::{Color, Modifier};

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_short_line_untouched() {
        let wrapped = wrap_lines(vec![Line::from("Short")], 20);
        assert_eq!(wrapped.len(), 1);
        assert_eq!(text_of(&wrapped[0]), "Short");
    }

    #[test]
    fn test_long_line_wraps_within_width() {
        let wrapped = wrap_lines(
            vec![Line::from("Hello world this is a long line that must wrap")],
            12,
        );
        assert!(wrapped.len() > 1);
        for line in &wrapped {
            assert!(text_of(line).width() <= 12, "too wide: {:?}", text_of(line));
        }
        let words: Vec<String> = wrapped.iter().map(text_of).collect();
        assert_eq!(
            words.join(" "),
            "Hello world this is a long line that must wrap"
        );
    }

    #[test]
    fn test_style_preserved_across_break() {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let line = Line::from(vec![
            Span::styled("plain words ", Style::default().fg(Color::Red)),
            Span::styled("bold words here", bold),
        ]);
        let wrapped = wrap_lines(vec![line], 11);

        assert_eq!(text_of(&wrapped[0]), "plain words");
        assert_eq!(text_of(&wrapped[1]), "bold words");
        assert!(wrapped[1].spans.iter().all(|s| s.style == bold));
    }

    #[test]
    fn test_zero_width_is_noop() {
        let lines = vec![Line::from("anything at all")];
        assert_eq!(wrap_lines(lines, 0).len(), 1);
    }

    #[test]
    fn test_unicode_content_preserved() {
        let text = "Hello 🎉 world 你好 this is a test with émojis";
        let wrapped = wrap_lines(vec![Line::from(text)], 10);
        let rejoined: Vec<String> = wrapped.iter().map(text_of).collect();
        let rejoined = rejoined.join(" ");
        assert!(rejoined.contains("🎉"));
        assert!(rejoined.contains("你好"));
        assert!(rejoined.contains("émojis"));
    }
}
