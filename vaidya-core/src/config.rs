//! Runtime configuration.
//!
//! Values come from the environment; callers (the CLI) may override any of
//! them with the builder methods. A missing API key is allowed here and only
//! surfaces when a completion is attempted.

use crate::respond::{GenerationConfig, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use chat_api::ChatClient;
use std::path::PathBuf;

pub const API_KEY_ENV: &str = "VAIDYA_API_KEY";
pub const MODEL_ENV: &str = "VAIDYA_MODEL";
pub const BASE_URL_ENV: &str = "VAIDYA_BASE_URL";
pub const DATA_DIR_ENV: &str = "VAIDYA_DATA_DIR";

/// Configuration for a chat session.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Provider API key.
    pub api_key: Option<String>,

    /// Model to request; the client default is used when unset.
    pub model: Option<String>,

    /// Root of an OpenAI-compatible API.
    pub base_url: Option<String>,

    /// Directory holding persisted memory.
    pub data_dir: Option<PathBuf>,

    pub temperature: f32,

    pub max_tokens: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            base_url: None,
            data_dir: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl ChatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `VAIDYA_*` variables. The key falls back to `OPENAI_API_KEY`.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            api_key: var(API_KEY_ENV).or_else(|| var(chat_api::API_KEY_ENV)),
            model: var(MODEL_ENV),
            base_url: var(BASE_URL_ENV),
            data_dir: var(DATA_DIR_ENV).map(PathBuf::from),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Where memory is stored: the configured directory, else the platform
    /// data directory, else `./.vaidya`.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("vaidya"))
                .unwrap_or_else(|| PathBuf::from(".vaidya"))
        })
    }

    /// Build the HTTP client described by this configuration.
    pub fn build_client(&self) -> ChatClient {
        let mut client = ChatClient::with_optional_key(self.api_key.clone());
        if let Some(ref model) = self.model {
            client = client.with_model(model.clone());
        }
        if let Some(ref base_url) = self.base_url {
            client = client.with_base_url(base_url.clone());
        }
        client
    }

    pub fn generation(&self) -> GenerationConfig {
        GenerationConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}
