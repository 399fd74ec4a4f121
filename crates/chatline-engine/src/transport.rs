//! Transport seam between the conversation client and the chat endpoint.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::protocol::{decode_reply, ChatReply, ChatRequest, DecodeError};

/// Performs one request/response exchange with the chat endpoint.
///
/// Implementations must not retry and must not time out on their own: every
/// call runs to a reply or a failure.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `request` and decode the endpoint's answer.
    async fn exchange(&self, request: &ChatRequest) -> Result<ChatReply, TransportError>;
}

/// Errors that prevent an exchange from producing a [`ChatReply`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection, TLS or body read failure.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("Endpoint returned status {0}")]
    Status(StatusCode),

    /// Body could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Endpoint could not be reached at all.
    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),
}

/// JSON-over-HTTP transport posting to a single endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Create a transport for `endpoint`.
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    /// The endpoint requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn exchange(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        debug!(
            endpoint = %self.endpoint,
            history = request.chat_history.len(),
            "Posting chat request"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }

        let body = response.bytes().await?;
        Ok(decode_reply(&body)?)
    }
}

#[cfg(any(test, feature = "testing"))]
pub use scripted::ScriptedTransport;

#[cfg(any(test, feature = "testing"))]
mod scripted {
    use super::{async_trait, ChatReply, ChatRequest, ChatTransport, TransportError};
    use std::collections::VecDeque;
    use std::sync::{Mutex, PoisonError};

    /// Transport that replays queued results and records every request.
    ///
    /// Once the queue is empty every exchange fails with
    /// [`TransportError::Unreachable`].
    #[derive(Debug, Default)]
    pub struct ScriptedTransport {
        results: Mutex<VecDeque<Result<ChatReply, TransportError>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedTransport {
        /// Create a transport with nothing queued.
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a successful reply.
        #[must_use]
        pub fn reply(self, text: impl Into<String>) -> Self {
            self.push(Ok(ChatReply::Reply(text.into())))
        }

        /// Queue an application-signaled error.
        #[must_use]
        pub fn error_signal(self) -> Self {
            self.push(Ok(ChatReply::Error(serde_json::Value::String(
                "scripted error".into(),
            ))))
        }

        /// Queue a transport failure.
        #[must_use]
        pub fn failure(self) -> Self {
            self.push(Err(TransportError::Unreachable("scripted failure".into())))
        }

        fn push(self, result: Result<ChatReply, TransportError>) -> Self {
            self.results
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back(result);
            self
        }

        /// Requests received so far, oldest first.
        pub fn requests(&self) -> Vec<ChatRequest> {
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn exchange(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(request.clone());

            self.results
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Unreachable("nothing scripted".into())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Transcript;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn transport_for(server: &MockServer) -> HttpTransport {
        let url = Url::parse(&format!("{}/chat", server.uri())).unwrap();
        HttpTransport::new(url)
    }

    #[tokio::test]
    async fn test_posts_json_and_decodes_reply() {
        let server = MockServer::start().await;
        let expected = json!({ "message": "start", "chat_history": [] });
        let body = json!({ "response": "Hi there" });
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("content-type", "application/json"))
            .and(body_json(expected))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server).await;
        assert_eq!(transport.endpoint().path(), "/chat");
        let request = ChatRequest::new("start", &Transcript::new());
        let reply = transport.exchange(&request).await.unwrap();

        assert_eq!(reply, ChatReply::Reply("Hi there".into()));
    }

    #[tokio::test]
    async fn test_error_signal_is_a_reply() {
        let server = MockServer::start().await;
        let body = json!({ "error": "boom" });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let transport = transport_for(&server).await;
        let reply = transport
            .exchange(&ChatRequest::new("hi", &Transcript::new()))
            .await
            .unwrap();

        assert_eq!(reply, ChatReply::Error(json!("boom")));
    }

    #[tokio::test]
    async fn test_non_success_status_fails() {
        let server = MockServer::start().await;
        let body = json!({ "response": "ignored" });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(body))
            .mount(&server)
            .await;

        let transport = transport_for(&server).await;
        let err = transport
            .exchange(&ChatRequest::new("hi", &Transcript::new()))
            .await
            .unwrap_err();

        let TransportError::Status(status) = err else {
            panic!("expected a status error");
        };
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_malformed_body_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let transport = transport_for(&server).await;
        let err = transport
            .exchange(&ChatRequest::new("hi", &Transcript::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Decode(DecodeError::Json(_))));
    }

    #[tokio::test]
    async fn test_missing_reply_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let transport = transport_for(&server).await;
        let err = transport
            .exchange(&ChatRequest::new("hi", &Transcript::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Decode(DecodeError::MissingReply)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails() {
        // Reserve a free port, then release it so nothing is listening there.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let url = Url::parse(&format!("http://127.0.0.1:{port}/chat")).unwrap();
        let transport = HttpTransport::new(url);
        let err = transport
            .exchange(&ChatRequest::new("hi", &Transcript::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Request(_)));
    }

    #[tokio::test]
    async fn test_scripted_transport_replays_in_order() {
        let transport = ScriptedTransport::new().reply("one").failure();
        let request = ChatRequest::new("hi", &Transcript::new());

        assert_eq!(
            transport.exchange(&request).await.unwrap(),
            ChatReply::Reply("one".into())
        );
        assert!(transport.exchange(&request).await.is_err());
        assert!(matches!(
            transport.exchange(&request).await,
            Err(TransportError::Unreachable(_))
        ));
        assert_eq!(transport.requests().len(), 3);
    }
}
