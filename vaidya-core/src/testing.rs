//! Testing utilities for the chat pipeline.
//!
//! [`MockProvider`] answers completion requests from a script instead of
//! the network, and records every request it receives so tests can assert
//! on the exact prompt that was sent.

use crate::respond::CompletionProvider;
use async_trait::async_trait;
use chat_api::{Choice, FinishReason, Request, Response};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Reply used once the script runs out.
pub const EXHAUSTED_REPLY: &str = "The mock provider has no more scripted responses.";

/// A scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// A successful completion with this text.
    Text(String),
    /// A successful completion whose first choice has no content.
    NoContent,
    /// A failed call.
    Fail(MockFailure),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        MockReply::Text(text.into())
    }
}

/// The kind of failure a scripted reply produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Network,
    Status(u16),
    Malformed,
    NoApiKey,
}

impl MockFailure {
    fn to_error(self) -> chat_api::Error {
        match self {
            MockFailure::Network => chat_api::Error::Network("connection refused".to_string()),
            MockFailure::Status(status) => chat_api::Error::Api {
                status,
                message: "scripted failure".to_string(),
            },
            MockFailure::Malformed => chat_api::Error::Parse("missing field `choices`".to_string()),
            MockFailure::NoApiKey => chat_api::Error::NoApiKey,
        }
    }
}

/// A completion provider that returns scripted replies in order.
#[derive(Debug, Default)]
pub struct MockProvider {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<Request>>,
}

impl MockProvider {
    /// Create a provider with scripted replies.
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Add a reply to the end of the script.
    pub fn queue_reply(&self, reply: MockReply) {
        self.replies.lock().push_back(reply);
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<Request> {
        self.requests.lock().last().cloned()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, request: Request) -> Result<Response, chat_api::Error> {
        self.requests.lock().push(request);

        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| MockReply::text(EXHAUSTED_REPLY));

        let content = match reply {
            MockReply::Text(text) => Some(text),
            MockReply::NoContent => None,
            MockReply::Fail(failure) => return Err(failure.to_error()),
        };

        Ok(Response {
            id: Some("mock".to_string()),
            model: Some("mock-model".to_string()),
            choices: vec![Choice {
                index: 0,
                content,
                finish_reason: Some(FinishReason::Stop),
            }],
            usage: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_api::Message;

    #[tokio::test]
    async fn test_replies_in_order() {
        let provider = MockProvider::new(vec![MockReply::text("first"), MockReply::text("second")]);
        provider.queue_reply(MockReply::text("third"));

        for expected in ["first", "second", "third", EXHAUSTED_REPLY] {
            let response = provider
                .complete(Request::new(vec![Message::user("hi")]))
                .await
                .unwrap();
            assert_eq!(response.text(), expected);
        }
        assert_eq!(provider.requests().len(), 4);
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn test_failure_reply() {
        let provider = MockProvider::new(vec![MockReply::Fail(MockFailure::Malformed)]);
        let result = provider.complete(Request::new(vec![])).await;
        assert!(matches!(result, Err(chat_api::Error::Parse(_))));
        assert!(provider.last_request().is_some());
    }
}
