//! Application state for the chat window.

use std::sync::Arc;

use chatline_engine::{
    ChatReply, ChatRequest, ChatTransport, Config, ConversationClient, RenderSurface,
    TransportError, TurnOutcome,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEventKind};
use ratatui::Frame;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::event::{key_to_action, Action};
use crate::theme::Theme;
use crate::view::ChatView;
use crate::widget::ChatWidget;

/// Lines moved per PageUp/PageDown.
const PAGE_LINES: usize = 10;

/// Lines moved per mouse wheel step.
const WHEEL_LINES: usize = 3;

/// Which client operation an in-flight exchange completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExchangeKind {
    Bootstrap,
    Turn,
}

struct PendingExchange {
    kind: ExchangeKind,
    handle: JoinHandle<Result<ChatReply, TransportError>>,
}

/// Chat window state: the conversation client rendering into a [`ChatView`],
/// plus at most one exchange running on the tokio runtime.
pub struct App<T: ChatTransport + 'static> {
    client: ConversationClient<T, ChatView>,
    pending: Option<PendingExchange>,
    theme: Theme,
    endpoint: String,
    /// Set when the user asks to leave.
    pub should_quit: bool,
}

impl<T: ChatTransport + 'static> App<T> {
    /// Create the app. Nothing is sent until [`App::start`].
    pub fn new(transport: Arc<T>, config: Config, theme: Theme) -> Self {
        let endpoint = config.endpoint.clone();
        Self {
            client: ConversationClient::with_config(transport, ChatView::new(), config),
            pending: None,
            theme,
            endpoint,
            should_quit: false,
        }
    }

    /// The conversation client.
    pub fn client(&self) -> &ConversationClient<T, ChatView> {
        &self.client
    }

    /// The rendered view.
    pub fn view(&self) -> &ChatView {
        self.client.surface()
    }

    /// Whether an exchange is running.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Run the opening exchange in the background.
    pub fn start(&mut self) {
        if let Some(request) = self.client.begin_bootstrap() {
            self.spawn(ExchangeKind::Bootstrap, request);
        }
    }

    fn spawn(&mut self, kind: ExchangeKind, request: ChatRequest) {
        let transport = self.client.transport();
        let handle = tokio::spawn(async move { transport.exchange(&request).await });
        self.pending = Some(PendingExchange { kind, handle });
    }

    /// Draw the chat window over the whole frame.
    pub fn render(&mut self, frame: &mut Frame<'_>) {
        let Self {
            client,
            theme,
            endpoint,
            ..
        } = self;
        let widget = ChatWidget::new(theme).endpoint(endpoint);
        frame.render_stateful_widget(widget, frame.area(), client.surface_mut());
    }

    /// Advance animations.
    pub fn tick(&mut self) {
        self.client.surface_mut().tick();
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        let enabled = self.view().controls_enabled();

        match key_to_action(key) {
            Action::Quit => self.should_quit = true,
            Action::Submit => {
                if enabled {
                    self.submit();
                }
            }
            Action::ScrollUp => self.client.surface_mut().scroll_up(1),
            Action::ScrollDown => self.client.surface_mut().scroll_down(1),
            Action::PageUp => self.client.surface_mut().scroll_up(PAGE_LINES),
            Action::PageDown => self.client.surface_mut().scroll_down(PAGE_LINES),
            Action::HistoryPrev => {
                if enabled {
                    self.client.surface_mut().input.history_prev();
                }
            }
            Action::HistoryNext => {
                if enabled {
                    self.client.surface_mut().input.history_next();
                }
            }
            Action::Follow => {
                let view = self.client.surface_mut();
                view.scroll_to_latest();
                if enabled {
                    view.input.move_end();
                }
            }
            Action::None => {
                if enabled {
                    self.edit(key);
                }
            }
        }
    }

    /// Handle a mouse event.
    pub fn handle_mouse(&mut self, kind: MouseEventKind) {
        match kind {
            MouseEventKind::ScrollUp => self.client.surface_mut().scroll_up(WHEEL_LINES),
            MouseEventKind::ScrollDown => self.client.surface_mut().scroll_down(WHEEL_LINES),
            _ => {}
        }
    }

    fn edit(&mut self, key: KeyEvent) {
        let input = &mut self.client.surface_mut().input;
        let chord = key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        match key.code {
            KeyCode::Char(c) if !chord => input.insert(c),
            KeyCode::Backspace => input.backspace(),
            KeyCode::Delete => input.delete(),
            KeyCode::Left => input.move_left(),
            KeyCode::Right => input.move_right(),
            KeyCode::Home => input.move_home(),
            _ => {}
        }
    }

    fn submit(&mut self) {
        let text = self.view().input.content().to_string();
        let Some(request) = self.client.begin_turn(&text) else {
            return;
        };
        debug!(chars = request.message.chars().count(), "Sending message");
        self.client.surface_mut().input.remember(&request.message);
        self.spawn(ExchangeKind::Turn, request);
    }

    /// Complete the running exchange if it has finished.
    ///
    /// Never blocks on an unfinished exchange.
    pub async fn poll_pending(&mut self) -> Option<TurnOutcome> {
        if !self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.handle.is_finished())
        {
            return None;
        }
        let pending = self.pending.take()?;
        Some(self.finish(pending).await)
    }

    async fn finish(&mut self, pending: PendingExchange) -> TurnOutcome {
        let result = pending.handle.await.unwrap_or_else(|e| {
            warn!(error = %e, "Exchange task failed");
            Err(TransportError::Unreachable(e.to_string()))
        });

        match pending.kind {
            ExchangeKind::Bootstrap => self.client.complete_bootstrap(result),
            ExchangeKind::Turn => self.client.complete_turn(result),
        }
    }

    /// Abort any running exchange.
    pub fn shutdown(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }

    /// Wait for the running exchange and complete it.
    #[cfg(test)]
    pub(crate) async fn settle(&mut self) -> Option<TurnOutcome> {
        let pending = self.pending.take()?;
        Some(self.finish(pending).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatline_engine::{Role, ScriptedTransport};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App<ScriptedTransport>, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn app_with(transport: ScriptedTransport) -> (App<ScriptedTransport>, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let app = App::new(Arc::clone(&transport), Config::default(), Theme::default());
        (app, transport)
    }

    fn last_body(app: &App<ScriptedTransport>) -> String {
        app.view()
            .messages()
            .last()
            .map(|node| node.body.to_plain_text())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_start_runs_bootstrap() {
        let (mut app, transport) = app_with(ScriptedTransport::new().reply("Welcome!"));

        app.start();
        assert!(app.has_pending());
        assert!(app.view().is_loading());
        assert!(!app.view().controls_enabled());

        assert_eq!(app.settle().await, Some(TurnOutcome::Replied));
        assert!(!app.view().is_loading());
        assert!(app.view().controls_enabled());
        assert_eq!(last_body(&app), "Welcome!");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].message, "start");
        assert!(requests[0].chat_history.is_empty());
    }

    #[tokio::test]
    async fn test_bootstrap_failure_shows_greeting() {
        let (mut app, _transport) = app_with(ScriptedTransport::new().failure());

        app.start();
        assert_eq!(app.settle().await, Some(TurnOutcome::TransportFailed));
        assert_eq!(last_body(&app), "Hello! How can I assist you today?");
    }

    #[tokio::test]
    async fn test_start_only_bootstraps_once() {
        let (mut app, transport) = app_with(ScriptedTransport::new().reply("Welcome!"));

        app.start();
        app.settle().await;
        app.start();
        assert!(!app.has_pending());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_typed_message_is_sent() {
        let transport = ScriptedTransport::new()
            .reply("Welcome!")
            .reply("**Hi** there");
        let (mut app, transport) = app_with(transport);
        app.start();
        app.settle().await;

        type_text(&mut app, "  hello  ");
        app.handle_key(key(KeyCode::Enter));

        assert!(app.view().input.is_empty());
        assert!(app.view().is_loading());
        assert_eq!(app.view().messages().len(), 2);
        assert_eq!(app.view().messages()[1].role, Role::Human);
        assert_eq!(last_body(&app), "hello");

        assert_eq!(app.settle().await, Some(TurnOutcome::Replied));
        assert_eq!(last_body(&app), "Hi there");

        let requests = transport.requests();
        assert_eq!(requests[1].message, "hello");
        assert_eq!(requests[1].chat_history.len(), 2);
        assert_eq!(app.client().transcript().len(), 3);
    }

    #[tokio::test]
    async fn test_turn_failure_shows_error_message() {
        let (mut app, _transport) =
            app_with(ScriptedTransport::new().reply("Welcome!").error_signal());
        app.start();
        app.settle().await;

        type_text(&mut app, "hello");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.settle().await, Some(TurnOutcome::ErrorSignaled));
        assert_eq!(
            last_body(&app),
            "Sorry, an error occurred. Please try again."
        );
        assert!(app.view().controls_enabled());
    }

    #[tokio::test]
    async fn test_input_ignored_while_waiting() {
        let (mut app, transport) = app_with(ScriptedTransport::new().reply("Welcome!"));
        app.start();

        type_text(&mut app, "early");
        app.handle_key(key(KeyCode::Enter));

        assert!(app.view().input.is_empty());
        app.settle().await;
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(app.view().messages().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_submit_ignored() {
        let (mut app, transport) = app_with(ScriptedTransport::new().reply("Welcome!"));
        app.start();
        app.settle().await;

        type_text(&mut app, "   ");
        app.handle_key(key(KeyCode::Enter));

        assert!(!app.has_pending());
        assert_eq!(app.view().input.content(), "   ");
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_history_recall_after_send() {
        let (mut app, _transport) =
            app_with(ScriptedTransport::new().reply("Welcome!").reply("ok"));
        app.start();
        app.settle().await;

        type_text(&mut app, "first question");
        app.handle_key(key(KeyCode::Enter));
        app.settle().await;

        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.view().input.content(), "first question");
    }

    #[tokio::test]
    async fn test_poll_pending_completes_without_blocking() {
        let (mut app, _transport) = app_with(ScriptedTransport::new().reply("Welcome!"));
        assert_eq!(app.poll_pending().await, None);

        app.start();
        let mut outcome = None;
        for _ in 0..100 {
            outcome = app.poll_pending().await;
            if outcome.is_some() {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert_eq!(outcome, Some(TurnOutcome::Replied));
        assert!(!app.has_pending());
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let (mut app, _transport) = app_with(ScriptedTransport::new());
        app.handle_key(key(KeyCode::Esc));
        assert!(app.should_quit);

        let (mut app, _transport) = app_with(ScriptedTransport::new());
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
        assert!(app.view().input.is_empty());
    }

    #[tokio::test]
    async fn test_scroll_keys_move_view() {
        let (mut app, _transport) = app_with(ScriptedTransport::new());
        app.handle_key(key(KeyCode::PageUp));
        assert_eq!(app.view().scroll_back(), PAGE_LINES);

        app.handle_mouse(MouseEventKind::ScrollDown);
        assert_eq!(app.view().scroll_back(), PAGE_LINES - WHEEL_LINES);

        app.handle_key(key(KeyCode::End));
        assert!(app.view().is_following());
    }
}
