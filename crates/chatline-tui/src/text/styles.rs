//! Markup styling configuration.

use ratatui::style::{Modifier, Style};

use crate::theme::Theme;

/// Styles for rendering message markup.
#[derive(Debug, Clone)]
pub struct MarkupStyles {
    /// Normal text style.
    pub text: Style,
    /// Strong (bold) style, patched over the surrounding style.
    pub strong: Style,
    /// Emphasis (italic) style, patched over the surrounding style.
    pub emphasis: Style,
    /// Link label style.
    pub link: Style,
    /// Link target shown after the label.
    pub link_target: Style,
    /// Bullet glyph style.
    pub list_marker: Style,
}

impl MarkupStyles {
    /// Create styles from a theme.
    pub fn from_theme(theme: &Theme) -> Self {
        Self {
            text: Style::default().fg(theme.text),
            strong: Style::default().add_modifier(Modifier::BOLD),
            emphasis: Style::default().add_modifier(Modifier::ITALIC),
            link: Style::default()
                .fg(theme.info)
                .add_modifier(Modifier::UNDERLINED),
            link_target: Style::default().fg(theme.muted),
            list_marker: Style::default().fg(theme.muted),
        }
    }
}

impl Default for MarkupStyles {
    fn default() -> Self {
        Self::from_theme(&Theme::default())
    }
}
