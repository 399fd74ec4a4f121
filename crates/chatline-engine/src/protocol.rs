//! Wire format of the `/chat` endpoint.
//!
//! One JSON request per turn carrying the message and the full transcript,
//! one JSON response carrying either a reply or an error signal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transcript::{Transcript, TranscriptEntry};

/// Request body for `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// User text, or the bootstrap sentinel.
    pub message: String,
    /// Every transcript entry so far, oldest first.
    pub chat_history: Vec<TranscriptEntry>,
}

impl ChatRequest {
    /// Build a request from a message and the current transcript.
    pub fn new(message: impl Into<String>, transcript: &Transcript) -> Self {
        Self {
            message: message.into(),
            chat_history: transcript.entries().to_vec(),
        }
    }
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    /// The endpoint answered with reply text.
    Reply(String),
    /// The endpoint signaled an error. The payload is kept for diagnostics only.
    Error(Value),
}

/// Raw response shape. Both fields are optional on the wire.
#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

/// Why a response body could not be turned into a [`ChatReply`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Body is not JSON of the expected shape.
    #[error("Malformed response body: {0}")]
    Json(#[from] serde_json::Error),

    /// Body has neither an error signal nor a `response` string.
    #[error("Response body has no reply text")]
    MissingReply,
}

/// Decode a response body.
///
/// A truthy `error` field wins over `response`. Truthiness follows the
/// browser client this protocol was built for: `null`, `false`, `0` and
/// `""` do not signal an error.
pub fn decode_reply(body: &[u8]) -> Result<ChatReply, DecodeError> {
    let raw: RawReply = serde_json::from_slice(body)?;

    if let Some(error) = raw.error.filter(is_truthy) {
        return Ok(ChatReply::Error(error));
    }

    raw.response
        .map(ChatReply::Reply)
        .ok_or(DecodeError::MissingReply)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
