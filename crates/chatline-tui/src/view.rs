//! Terminal rendering surface.

use chatline_engine::{MessageNode, RenderSurface};

use crate::input::TextInputState;

/// Spinner frames for the loading placeholder.
const SPINNER: [&str; 4] = ["⠋", "⠙", "⠸", "⠴"];

/// Everything the chat widget draws, mutated by the conversation client
/// through [`RenderSurface`] and by key handling through [`ChatView::input`].
#[derive(Debug, Clone)]
pub struct ChatView {
    messages: Vec<MessageNode>,
    loading: bool,
    controls_enabled: bool,
    /// Text input state.
    pub input: TextInputState,
    /// Lines scrolled up from the bottom; zero follows new messages.
    scroll_back: usize,
    spinner_frame: usize,
}

impl Default for ChatView {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            loading: false,
            controls_enabled: true,
            input: TextInputState::new(),
            scroll_back: 0,
            spinner_frame: 0,
        }
    }
}

impl ChatView {
    /// Create an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered messages, oldest first.
    pub fn messages(&self) -> &[MessageNode] {
        &self.messages
    }

    /// Whether the loading placeholder is shown.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the input and send control accept interaction.
    pub fn controls_enabled(&self) -> bool {
        self.controls_enabled
    }

    /// Lines scrolled up from the newest message.
    pub fn scroll_back(&self) -> usize {
        self.scroll_back
    }

    /// Whether the view follows new messages.
    pub fn is_following(&self) -> bool {
        self.scroll_back == 0
    }

    /// Scroll toward older messages.
    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
    }

    /// Scroll toward newer messages; reaching the bottom resumes following.
    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }

    /// Limit scrolling to the content actually available.
    pub fn clamp_scroll(&mut self, max_scroll_back: usize) {
        self.scroll_back = self.scroll_back.min(max_scroll_back);
    }

    /// Advance the spinner animation.
    pub fn tick(&mut self) {
        if self.loading {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER.len();
        }
    }

    /// Current spinner glyph.
    pub fn spinner(&self) -> &'static str {
        SPINNER[self.spinner_frame % SPINNER.len()]
    }
}

impl RenderSurface for ChatView {
    fn append_message(&mut self, node: MessageNode) {
        self.messages.push(node);
    }

    fn scroll_to_latest(&mut self) {
        self.scroll_back = 0;
    }

    fn set_controls_enabled(&mut self, enabled: bool) {
        self.controls_enabled = enabled;
    }

    fn show_loading(&mut self) {
        self.loading = true;
        self.spinner_frame = 0;
    }

    fn hide_loading(&mut self) {
        self.loading = false;
    }

    fn clear_input(&mut self) {
        self.input.clear();
    }
}
