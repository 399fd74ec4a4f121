//! chatline-tui: Terminal chat window for the chatline chat client
//!
//! This crate hosts the conversation client in a full-screen terminal:
//! - A scrolling message list with formatted bodies and timestamps
//! - A one-line input with a send control, disabled while a reply is pending
//! - A loading placeholder while an exchange is in flight

mod app;
mod event;
mod input;
#[cfg(test)]
pub mod test_utils;
mod text;
mod theme;
mod view;
mod widget;

pub use app::App;
pub use chatline_engine;
pub use event::{Action, Event, EventHandler};
pub use input::TextInputState;
pub use theme::Theme;
pub use view::ChatView;
pub use widget::ChatWidget;

use std::io::{self, stdout};
use std::sync::Arc;

use chatline_engine::{ChatTransport, Config, HttpTransport};
use crossterm::{
    cursor::Show as ShowCursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

/// Tick interval driving the spinner and exchange polling.
const TICK_RATE_MS: u64 = 100;

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            stdout(),
            DisableMouseCapture,
            LeaveAlternateScreen,
            ShowCursor
        );
    }
}

/// Run the chat window against the configured endpoint.
///
/// Sets up the terminal, sends the opening exchange, runs the event loop,
/// and restores the terminal on exit.
pub async fn run_tui(config: Config, theme: Theme) -> Result<(), Box<dyn std::error::Error>> {
    let transport = Arc::new(HttpTransport::new(config.endpoint_url()?));
    info!(endpoint = %transport.endpoint(), "Starting chat window");

    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(transport, config, theme);
    app.start();

    let mut events = EventHandler::new(TICK_RATE_MS);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;
    app.shutdown();

    terminal.show_cursor()?;
    info!(
        messages = app.client().transcript().len(),
        "Chat window closed"
    );

    result
}

async fn run_loop<T: ChatTransport + 'static>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<T>,
    events: &mut EventHandler,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| app.render(frame))?;

        if let Some(event) = events.next().await {
            match event {
                Event::Key(key) => app.handle_key(key),
                Event::Mouse(mouse) => app.handle_mouse(mouse.kind),
                Event::Tick => app.tick(),
                // Terminal will handle resize automatically
                Event::Resize(_, _) => {}
            }
        }

        app.poll_pending().await;

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
