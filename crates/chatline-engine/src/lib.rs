//! chatline-engine: Headless conversation engine for the chatline chat client
//!
//! This crate provides everything except the terminal:
//! - Transcript and wire protocol for the `/chat` endpoint
//! - Inline message formatting into an escaped markup tree
//! - The rendering surface contract and an in-memory implementation
//! - The conversation client driving one exchange per user turn
//! - Configuration

pub mod client;
pub mod config;
pub mod markup;
pub mod protocol;
pub mod surface;
pub mod transcript;
pub mod transport;

// Re-export commonly used types
pub use client::{ConversationClient, RequestState, TurnOutcome};
pub use config::{
    config_dir, Config, ConfigError, DEFAULT_BOOTSTRAP_MESSAGE, DEFAULT_ERROR_MESSAGE,
    DEFAULT_FALLBACK_GREETING,
};
pub use markup::{escape_html, format_text, Inline, Markup, MarkupLine, BULLET_GLYPH};
pub use protocol::{decode_reply, ChatReply, ChatRequest, DecodeError};
pub use surface::{MessageList, MessageNode, RenderSurface};
pub use transcript::{Role, Transcript, TranscriptEntry};
#[cfg(any(test, feature = "testing"))]
pub use transport::ScriptedTransport;
pub use transport::{ChatTransport, HttpTransport, TransportError};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
