//! Rendering surface contract.
//!
//! The conversation client never draws anything itself. It appends message
//! nodes to, and toggles controls on, whatever host view implements
//! [`RenderSurface`].

use crate::markup::{escape_html, Markup};
use crate::transcript::Role;

/// A rendered message as handed to the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageNode {
    /// Who authored the message.
    pub role: Role,
    /// Formatted body.
    pub body: Markup,
    /// Human-readable time the message was appended, if enabled.
    pub timestamp_label: Option<String>,
}

/// Host view the conversation client renders into.
///
/// The host must provide a message list, a text input, a send control and a
/// loading placeholder. Calls arrive only from the thread that owns the
/// client.
pub trait RenderSurface {
    /// Append a node to the end of the message list.
    fn append_message(&mut self, node: MessageNode);

    /// Scroll the message list so the newest node is visible.
    fn scroll_to_latest(&mut self);

    /// Enable or disable both the text input and the send control.
    fn set_controls_enabled(&mut self, enabled: bool);

    /// Insert the loading placeholder after the last message.
    fn show_loading(&mut self);

    /// Remove the loading placeholder.
    fn hide_loading(&mut self);

    /// Clear the text input.
    fn clear_input(&mut self);
}

/// In-memory surface: a flat tree of message nodes plus control state.
///
/// Used by headless hosts and tests, and renders to HTML the same way a
/// page hosting the chat would be laid out.
#[derive(Debug, Clone)]
pub struct MessageList {
    nodes: Vec<MessageNode>,
    loading_visible: bool,
    controls_enabled: bool,
    input: String,
    scrolled_to: Option<usize>,
}

impl Default for MessageList {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            loading_visible: false,
            controls_enabled: true,
            input: String::new(),
            scrolled_to: None,
        }
    }
}

impl MessageList {
    /// Create an empty list with enabled controls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered nodes, oldest first.
    pub fn nodes(&self) -> &[MessageNode] {
        &self.nodes
    }

    /// Whether the loading placeholder is currently shown.
    pub fn is_loading_visible(&self) -> bool {
        self.loading_visible
    }

    /// Whether the input and send control accept interaction.
    pub fn controls_enabled(&self) -> bool {
        self.controls_enabled
    }

    /// Current input text.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the input text, as if the user typed it.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Index of the node last scrolled into view.
    pub fn scrolled_to(&self) -> Option<usize> {
        self.scrolled_to
    }

    /// Render the list as HTML.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<div id=\"chat-messages\">\n");
        for node in &self.nodes {
            let class = if node.role.is_human() {
                "user-message"
            } else {
                "bot-message"
            };
            html.push_str("  <div class=\"message ");
            html.push_str(class);
            html.push_str("\">");
            html.push_str(&node.body.to_html());
            if let Some(label) = &node.timestamp_label {
                html.push_str("<span class=\"timestamp\">");
                html.push_str(&escape_html(label));
                html.push_str("</span>");
            }
            html.push_str("</div>\n");
        }
        if self.loading_visible {
            html.push_str("  <div class=\"message bot-message loading-message\"></div>\n");
        }
        html.push_str("</div>");
        html
    }
}

impl RenderSurface for MessageList {
    fn append_message(&mut self, node: MessageNode) {
        self.nodes.push(node);
    }

    fn scroll_to_latest(&mut self) {
        self.scrolled_to = self.nodes.len().checked_sub(1);
    }

    fn set_controls_enabled(&mut self, enabled: bool) {
        self.controls_enabled = enabled;
    }

    fn show_loading(&mut self) {
        self.loading_visible = true;
    }

    fn hide_loading(&mut self) {
        self.loading_visible = false;
    }

    fn clear_input(&mut self) {
        self.input.clear();
    }
}
