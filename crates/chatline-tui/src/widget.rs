//! Chat window widget.
//!
//! Message list on top, a divider, then the one-line input with its send
//! control.

use chatline_engine::{MessageNode, Role};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    symbols::line,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, StatefulWidget, Widget},
};
use unicode_width::UnicodeWidthChar;

use crate::text::{render_markup, wrap_lines, MarkupStyles};
use crate::theme::Theme;
use crate::view::ChatView;

/// Height of the input row.
const INPUT_HEIGHT: u16 = 1;

/// Height of the divider line.
const DIVIDER_HEIGHT: u16 = 1;

const PROMPT: &str = "> ";
const SEND_LABEL: &str = "[ Send ]";
const SEND_WIDTH: u16 = 8;
const PLACEHOLDER: &str = "Type a message...";
const WAITING_PLACEHOLDER: &str = "Waiting for reply...";

/// Chat window rendering a [`ChatView`].
///
/// ```text
/// ┌─ Chat · http://127.0.0.1:5000/chat ──┐
/// │Assistant · 09:14                      │
/// │Hello! How can I assist you today?     │
/// │                                       │
/// │You · 09:15                            │
/// │what is **rust**?                      │
/// ├───────────────────────────────────────┤
/// │> Type a message...           [ Send ] │
/// └───────────────────────────────────────┘
/// ```
///
/// Rendering clamps the view's scroll position to the available content.
pub struct ChatWidget<'a> {
    theme: &'a Theme,
    endpoint: Option<&'a str>,
}

impl<'a> ChatWidget<'a> {
    /// Create a widget drawing with `theme`.
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            theme,
            endpoint: None,
        }
    }

    /// Show the endpoint in the title.
    #[must_use]
    pub fn endpoint(mut self, endpoint: &'a str) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    fn title(&self) -> String {
        match self.endpoint {
            Some(endpoint) => format!(" Chat · {endpoint} "),
            None => " Chat ".to_string(),
        }
    }

    /// Header line naming the author and, if present, the time.
    fn header(&self, node: &MessageNode) -> Line<'static> {
        let (name, color) = match node.role {
            Role::Human => ("You", self.theme.primary),
            Role::Ai => ("Assistant", self.theme.secondary),
        };
        let mut spans = vec![Span::styled(
            name,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )];
        if let Some(label) = &node.timestamp_label {
            spans.push(Span::styled(
                format!(" · {label}"),
                Style::default().fg(self.theme.subtext),
            ));
        }
        Line::from(spans)
    }

    /// All message list lines, wrapped to `width`.
    fn message_lines(&self, view: &ChatView, width: usize) -> Vec<Line<'static>> {
        let styles = MarkupStyles::from_theme(self.theme);
        let mut lines = Vec::new();

        for (i, node) in view.messages().iter().enumerate() {
            if i > 0 {
                lines.push(Line::default());
            }
            lines.push(self.header(node));
            lines.extend(wrap_lines(render_markup(&node.body, &styles), width));
        }

        if view.is_loading() {
            if !lines.is_empty() {
                lines.push(Line::default());
            }
            lines.push(Line::from(vec![
                Span::styled(view.spinner(), Style::default().fg(self.theme.info)),
                Span::styled(" thinking...", Style::default().fg(self.theme.muted)),
            ]));
        }

        lines
    }

    fn render_messages(&self, area: Rect, buf: &mut Buffer, view: &mut ChatView) {
        let lines = self.message_lines(view, area.width as usize);
        let height = area.height as usize;
        let max_back = lines.len().saturating_sub(height);
        view.clamp_scroll(max_back);

        let offset = max_back - view.scroll_back();
        let offset = u16::try_from(offset).unwrap_or(u16::MAX);
        Paragraph::new(lines).scroll((offset, 0)).render(area, buf);
    }

    fn render_divider(&self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 {
            return;
        }
        let divider = line::HORIZONTAL.repeat(area.width as usize);
        Paragraph::new(Line::from(Span::styled(
            divider,
            Style::default().fg(self.theme.border),
        )))
        .render(area, buf);
    }

    fn render_input(&self, area: Rect, buf: &mut Buffer, view: &ChatView) {
        let enabled = view.controls_enabled();
        let input = &view.input;

        let send_width = SEND_WIDTH + 1;
        let show_send = area.width > send_width + 6;
        let field_width = if show_send {
            area.width - send_width
        } else {
            area.width
        };
        let avail = (field_width as usize).saturating_sub(PROMPT.len());

        let prompt_color = if enabled {
            self.theme.primary
        } else {
            self.theme.muted
        };
        let mut spans = vec![Span::styled(PROMPT, Style::default().fg(prompt_color))];

        if input.is_empty() {
            if enabled {
                spans.push(Span::styled(" ", Style::default().add_modifier(Modifier::REVERSED)));
            }
            let placeholder = if enabled {
                PLACEHOLDER
            } else {
                WAITING_PLACEHOLDER
            };
            spans.push(Span::styled(placeholder, Style::default().fg(self.theme.muted)));
        } else {
            spans.extend(self.input_spans(view, avail));
        }

        let field = Rect::new(area.x, area.y, field_width, area.height);
        Paragraph::new(Line::from(spans)).render(field, buf);

        if show_send {
            let style = if enabled && !input.content().trim().is_empty() {
                Style::default()
                    .fg(self.theme.primary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted)
            };
            let send = Rect::new(area.x + field_width + 1, area.y, SEND_WIDTH, area.height);
            Paragraph::new(Span::styled(SEND_LABEL, style)).render(send, buf);
        }
    }

    /// Input content scrolled horizontally so the cursor stays in view.
    fn input_spans(&self, view: &ChatView, avail: usize) -> Vec<Span<'static>> {
        let input = &view.input;
        let chars: Vec<char> = input.content().chars().collect();
        let cursor = input.cursor().min(chars.len());
        let show_cursor = view.controls_enabled();

        // Keep one column free for the cursor cell at the end.
        let mut start = 0;
        while start < cursor && columns(&chars[start..cursor]) + 1 > avail {
            start += 1;
        }

        let text_style = Style::default().fg(self.theme.text);
        let cursor_style = text_style.add_modifier(Modifier::REVERSED);

        let mut spans = Vec::new();
        let mut before = String::new();
        let mut used = 0;
        let mut i = start;

        while i < chars.len() {
            let w = chars[i].width().unwrap_or(0);
            if used + w > avail {
                break;
            }
            if show_cursor && i == cursor {
                spans.push(Span::styled(std::mem::take(&mut before), text_style));
                spans.push(Span::styled(chars[i].to_string(), cursor_style));
            } else {
                before.push(chars[i]);
            }
            used += w;
            i += 1;
        }
        spans.push(Span::styled(before, text_style));

        if show_cursor && cursor == chars.len() && used < avail {
            spans.push(Span::styled(" ", cursor_style));
        }
        spans
    }
}

fn columns(chars: &[char]) -> usize {
    chars.iter().map(|c| c.width().unwrap_or(0)).sum()
}

impl StatefulWidget for ChatWidget<'_> {
    type State = ChatView;

    fn render(self, area: Rect, buf: &mut Buffer, view: &mut ChatView) {
        let border_style = if view.controls_enabled() {
            Style::default().fg(self.theme.border_focused)
        } else {
            Style::default().fg(self.theme.border)
        };

        let block = Block::default()
            .title(self.title())
            .title_style(Style::default().fg(self.theme.text))
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Style::default().bg(self.theme.base));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < INPUT_HEIGHT + DIVIDER_HEIGHT + 1 {
            self.render_input(inner, buf, view);
            return;
        }

        let list_height = inner.height - INPUT_HEIGHT - DIVIDER_HEIGHT;
        let divider_y = inner.y + list_height;
        let input_y = divider_y + DIVIDER_HEIGHT;

        let list_area = Rect::new(inner.x, inner.y, inner.width, list_height);
        let divider_area = Rect::new(inner.x, divider_y, inner.width, DIVIDER_HEIGHT);
        let input_area = Rect::new(inner.x, input_y, inner.width, INPUT_HEIGHT);

        self.render_messages(list_area, buf, view);
        self.render_divider(divider_area, buf);
        self.render_input(input_area, buf, view);
    }
}
