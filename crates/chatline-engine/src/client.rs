//! Conversation client.
//!
//! [`ConversationClient`] owns the transcript and the request state, renders
//! messages into a [`RenderSurface`] and runs one request/response exchange
//! per user turn through a [`ChatTransport`].
//!
//! Every operation comes in a split form (`begin_*` / `complete_*`) so a host
//! can keep drawing while the exchange is in flight, and a convenience form
//! (`send_turn`, `bootstrap`) that awaits the transport in between.

use chrono::{DateTime, Local, Utc};
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::markup::format_text;
use crate::protocol::{ChatReply, ChatRequest};
use crate::surface::{MessageNode, RenderSurface};
use crate::transcript::{Role, Transcript, TranscriptEntry};
use crate::transport::{ChatTransport, TransportError};

/// Whether a request is outstanding.
///
/// The only transitions are `Idle -> Sending` and `Sending -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    /// No request in flight; new turns are accepted.
    #[default]
    Idle,
    /// A request is in flight; new turns are rejected.
    Sending,
}

impl RequestState {
    /// Whether a request is in flight.
    pub fn is_loading(self) -> bool {
        self == RequestState::Sending
    }

    /// Move to `Sending`. Returns `false` if already sending.
    pub fn begin(&mut self) -> bool {
        if self.is_loading() {
            return false;
        }
        *self = RequestState::Sending;
        true
    }

    /// Move to `Idle`. Returns `false` if already idle.
    pub fn finish(&mut self) -> bool {
        if !self.is_loading() {
            return false;
        }
        *self = RequestState::Idle;
        true
    }
}

/// What a completed exchange appended to the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The endpoint's reply was appended.
    Replied,
    /// The endpoint signaled an error; a fixed message was appended.
    ErrorSignaled,
    /// The exchange failed; a fixed message was appended.
    TransportFailed,
}

impl TurnOutcome {
    /// Whether the endpoint's own reply was appended.
    pub fn is_reply(self) -> bool {
        self == TurnOutcome::Replied
    }
}

/// Conversation state and render loop for a single chat session.
pub struct ConversationClient<T, S> {
    transport: Arc<T>,
    surface: S,
    transcript: Transcript,
    state: RequestState,
    config: Config,
    bootstrapped: bool,
}

impl<T: ChatTransport, S: RenderSurface> ConversationClient<T, S> {
    /// Create a client with default settings.
    pub fn new(transport: Arc<T>, surface: S) -> Self {
        Self::with_config(transport, surface, Config::default())
    }

    /// Create a client using the strings and time format from `config`.
    pub fn with_config(transport: Arc<T>, surface: S, config: Config) -> Self {
        Self {
            transport,
            surface,
            transcript: Transcript::new(),
            state: RequestState::Idle,
            config,
            bootstrapped: false,
        }
    }

    /// The transcript so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The rendering surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access to the rendering surface, for host-side input handling.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// A shared handle to the transport, for hosts that dispatch exchanges themselves.
    pub fn transport(&self) -> Arc<T> {
        Arc::clone(&self.transport)
    }

    /// Current request state.
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Whether a request is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Settings in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Render `text` as a message and record it in the transcript.
    ///
    /// The transcript stores the raw text; the surface receives the
    /// formatted body and a local time label.
    pub fn append_message(&mut self, text: &str, role: Role) {
        let entry = TranscriptEntry::now(role, text);
        let timestamp_label = entry.timestamp.and_then(|at| self.timestamp_label(at));

        self.surface.append_message(MessageNode {
            role,
            body: format_text(text),
            timestamp_label,
        });
        self.surface.scroll_to_latest();
        self.transcript.push(entry);
    }

    fn timestamp_label(&self, at: DateTime<Utc>) -> Option<String> {
        let format = self.config.timestamp_format.as_deref()?;
        let mut label = String::new();
        // An invalid format string surfaces as a fmt error; drop the label.
        write!(label, "{}", at.with_timezone(&Local).format(format)).ok()?;
        Some(label)
    }

    /// Set the loading state and the controls that depend on it.
    ///
    /// Controls follow `active` on every call; the placeholder is only
    /// inserted or removed on an actual transition.
    pub fn set_loading(&mut self, active: bool) {
        let changed = if active {
            self.state.begin()
        } else {
            self.state.finish()
        };

        self.surface.set_controls_enabled(!active);

        if changed {
            if active {
                self.surface.show_loading();
                self.surface.scroll_to_latest();
            } else {
                self.surface.hide_loading();
            }
            debug!(loading = active, "Request state changed");
        }
    }

    /// Accept a user turn and build its request.
    ///
    /// Returns `None`, touching nothing, if the trimmed text is empty or a
    /// request is already in flight.
    pub fn begin_turn(&mut self, raw_text: &str) -> Option<ChatRequest> {
        let message = raw_text.trim();
        if message.is_empty() || self.is_loading() {
            debug!(
                empty = message.is_empty(),
                loading = self.is_loading(),
                "Ignoring send"
            );
            return None;
        }

        self.append_message(message, Role::Human);
        self.surface.clear_input();
        self.set_loading(true);

        Some(ChatRequest::new(message, &self.transcript))
    }

    /// Finish a user turn with the exchange result.
    ///
    /// Appends exactly one message: the reply, or the fixed error message.
    pub fn complete_turn(&mut self, result: Result<ChatReply, TransportError>) -> TurnOutcome {
        self.set_loading(false);

        let outcome = classify(result);
        match outcome {
            Classified::Reply(text) => {
                self.append_message(&text, Role::Ai);
                TurnOutcome::Replied
            }
            Classified::Failed(outcome) => {
                let message = self.config.error_message.clone();
                self.append_message(&message, Role::Ai);
                outcome
            }
        }
    }

    /// Run a full user turn: accept, exchange, complete.
    ///
    /// Returns `None` if the turn was rejected.
    pub async fn send_turn(&mut self, raw_text: &str) -> Option<TurnOutcome> {
        let request = self.begin_turn(raw_text)?;
        let result = self.transport.exchange(&request).await;
        Some(self.complete_turn(result))
    }

    /// Start the opening exchange: the sentinel message with an empty history.
    ///
    /// Returns `None` if the opening exchange already ran or a request is in
    /// flight.
    pub fn begin_bootstrap(&mut self) -> Option<ChatRequest> {
        if self.bootstrapped || self.is_loading() {
            return None;
        }
        self.bootstrapped = true;
        self.set_loading(true);

        Some(ChatRequest::new(
            self.config.bootstrap_message.clone(),
            &Transcript::new(),
        ))
    }

    /// Finish the opening exchange.
    ///
    /// On any failure the local fallback greeting is appended instead of the
    /// turn error message.
    pub fn complete_bootstrap(&mut self, result: Result<ChatReply, TransportError>) -> TurnOutcome {
        self.set_loading(false);

        match classify(result) {
            Classified::Reply(text) => {
                self.append_message(&text, Role::Ai);
                TurnOutcome::Replied
            }
            Classified::Failed(outcome) => {
                let greeting = self.config.fallback_greeting.clone();
                self.append_message(&greeting, Role::Ai);
                outcome
            }
        }
    }

    /// Run the opening exchange once.
    pub async fn bootstrap(&mut self) -> Option<TurnOutcome> {
        let request = self.begin_bootstrap()?;
        let result = self.transport.exchange(&request).await;
        Some(self.complete_bootstrap(result))
    }
}

enum Classified {
    Reply(String),
    Failed(TurnOutcome),
}

fn classify(result: Result<ChatReply, TransportError>) -> Classified {
    match result {
        Ok(ChatReply::Reply(text)) => Classified::Reply(text),
        Ok(ChatReply::Error(detail)) => {
            warn!(%detail, "Endpoint signaled an error");
            Classified::Failed(TurnOutcome::ErrorSignaled)
        }
        Err(e) => {
            warn!(error = %e, "Chat exchange failed");
            Classified::Failed(TurnOutcome::TransportFailed)
        }
    }
}
