//! Mock backend for testing flows without a live model.
//!
//! [`MockBackend`] returns pre-configured replies in order, counts
//! invocations and records every request it receives, so tests can assert
//! both on what a flow produced and on what it sent.
//!
//! # Example
//!
//! ```
//! use flowai_studio::client::{MockBackend, MockReply};
//! use serde_json::json;
//!
//! let mock = MockBackend::new(vec![
//!     MockReply::structured(json!({"correctedText": "Hello"})),
//!     MockReply::http_error(503, "overloaded"),
//! ]);
//! assert_eq!(mock.invocation_count(), 0);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{Backend, ModelRequest, ModelResponse};
use crate::error::{FlowError, Result};
use crate::media::DataUri;

/// One canned outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    Respond(ModelResponse),
    /// Fails like a non-2xx answer from the service.
    HttpError { status: u16, body: String },
}

impl MockReply {
    pub fn structured(value: Value) -> Self {
        MockReply::Respond(ModelResponse::structured(value))
    }

    pub fn text(text: impl Into<String>) -> Self {
        MockReply::Respond(ModelResponse::text(text))
    }

    pub fn media(uri: DataUri) -> Self {
        MockReply::Respond(ModelResponse::media(uri))
    }

    /// A completed call with nothing in it.
    pub fn empty() -> Self {
        MockReply::Respond(ModelResponse::default())
    }

    pub fn http_error(status: u16, body: impl Into<String>) -> Self {
        MockReply::HttpError {
            status,
            body: body.into(),
        }
    }
}

/// A test backend that returns canned replies in order.
///
/// Cycles back to the first reply once all have been used. With no replies
/// configured every call returns an empty response.
#[derive(Debug, Default)]
pub struct MockBackend {
    replies: Vec<MockReply>,
    index: AtomicUsize,
    requests: Mutex<Vec<ModelRequest>>,
}

impl MockBackend {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies,
            index: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A mock that always gives the same reply.
    pub fn fixed(reply: MockReply) -> Self {
        Self::new(vec![reply])
    }

    /// A mock that always returns the same structured value.
    pub fn fixed_json(value: Value) -> Self {
        Self::fixed(MockReply::structured(value))
    }

    /// Number of `invoke` calls so far.
    pub fn invocation_count(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }

    /// Every request received, in call order.
    pub fn requests(&self) -> Vec<ModelRequest> {
        match self.requests.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<ModelRequest> {
        self.requests().pop()
    }

    fn record(&self, request: &ModelRequest) {
        let mut guard = match self.requests.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(request.clone());
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn invoke(
        &self,
        _client: &Client,
        _base_url: &str,
        request: &ModelRequest,
    ) -> Result<ModelResponse> {
        let n = self.index.fetch_add(1, Ordering::SeqCst);
        self.record(request);

        if self.replies.is_empty() {
            return Ok(ModelResponse::default());
        }
        match &self.replies[n % self.replies.len()] {
            MockReply::Respond(resp) => Ok(resp.clone()),
            MockReply::HttpError { status, body } => Err(FlowError::Http {
                status: *status,
                body: body.clone(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PromptPart;
    use serde_json::json;

    fn request(prompt: &str) -> ModelRequest {
        ModelRequest::new("test", vec![PromptPart::text(prompt)])
    }

    #[tokio::test]
    async fn test_mock_cycles_replies() {
        let mock = MockBackend::new(vec![MockReply::text("first"), MockReply::text("second")]);
        let client = Client::new();
        let r1 = mock.invoke(&client, "http://unused", &request("a")).await.unwrap();
        let r2 = mock.invoke(&client, "http://unused", &request("b")).await.unwrap();
        let r3 = mock.invoke(&client, "http://unused", &request("c")).await.unwrap();
        assert_eq!(r1.text.as_deref(), Some("first"));
        assert_eq!(r2.text.as_deref(), Some("second"));
        assert_eq!(r3.text.as_deref(), Some("first"));
        assert_eq!(mock.invocation_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let mock = MockBackend::fixed_json(json!({"ok": true}));
        let client = Client::new();
        mock.invoke(&client, "http://unused", &request("hello"))
            .await
            .unwrap();
        assert_eq!(mock.requests().len(), 1);
        assert_eq!(mock.last_request().unwrap().prompt_text(), "hello");
    }

    #[tokio::test]
    async fn test_mock_injects_failure() {
        let mock = MockBackend::new(vec![MockReply::http_error(429, "slow down")]);
        let client = Client::new();
        let err = mock
            .invoke(&client, "http://unused", &request("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::Http { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_mock_without_replies_is_empty() {
        let mock = MockBackend::default();
        let resp = mock
            .invoke(&Client::new(), "http://unused", &request("x"))
            .await
            .unwrap();
        assert!(resp.is_empty());
    }
}
