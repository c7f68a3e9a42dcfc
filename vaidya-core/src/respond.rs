//! Response client: one completion call per assembled prompt.

use async_trait::async_trait;
use chat_api::{ChatClient, Message, Request, Response};
use thiserror::Error;
use tracing::debug;

/// Sampling temperature sent with every request.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Upper bound on reply length, in tokens.
pub const DEFAULT_MAX_TOKENS: usize = 500;

/// Errors from a completion call.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// Network failure, non-success status, or malformed reply.
    #[error("Provider error: {0}")]
    Provider(#[source] chat_api::Error),

    #[error("No API key configured - set VAIDYA_API_KEY or OPENAI_API_KEY")]
    MissingCredential,
}

impl From<chat_api::Error> for ResponseError {
    fn from(error: chat_api::Error) -> Self {
        match error {
            chat_api::Error::NoApiKey => ResponseError::MissingCredential,
            other => ResponseError::Provider(other),
        }
    }
}

/// Anything that can answer a completion request.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: Request) -> Result<Response, chat_api::Error>;
}

#[async_trait]
impl CompletionProvider for ChatClient {
    async fn complete(&self, request: Request) -> Result<Response, chat_api::Error> {
        ChatClient::complete(self, request).await
    }
}

/// Fixed generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Overrides the provider's default model when set.
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Sends assembled prompts to a [`CompletionProvider`].
#[derive(Debug, Clone)]
pub struct ResponseClient<P> {
    provider: P,
    config: GenerationConfig,
}

impl<P: CompletionProvider> ResponseClient<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, GenerationConfig::default())
    }

    pub fn with_config(provider: P, config: GenerationConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Send `messages` and return the first completion's text.
    ///
    /// A reply without content yields an empty string. There is no retry.
    pub async fn get_response(&self, messages: Vec<Message>) -> Result<String, ResponseError> {
        let mut request = Request::new(messages)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature);
        if let Some(ref model) = self.config.model {
            request = request.with_model(model.clone());
        }

        let response = self.provider.complete(request).await?;
        let text = response.text();
        debug!(chars = text.len(), "received completion");
        Ok(text)
    }
}
