//! ChatSession - the primary public API for a conversation.
//!
//! Wraps the conversation store, fact extraction, prompt assembly and the
//! response client into one request/response cycle per user message.

use crate::config::ChatConfig;
use crate::extract::extract;
use crate::memory::ConversationStore;
use crate::prompt::assemble;
use crate::respond::{CompletionProvider, ResponseClient, ResponseError};
use crate::storage::{FileStore, KeyValueStore, StorageError};
use chat_api::{ChatClient, Role};
use thiserror::Error;
use tracing::{debug, warn};

/// Shown to the user in place of a reply when a cycle fails.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I couldn't reach my knowledge source just now. Please try sending your message again.";

/// Errors from ChatSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Response(#[from] ResponseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Message is empty")]
    EmptyMessage,
}

/// A chat session over a store and a completion provider.
///
/// `send` takes `&mut self`, so cycles over one store never overlap.
pub struct ChatSession<S, P> {
    store: ConversationStore<S>,
    client: ResponseClient<P>,
}

impl ChatSession<FileStore, ChatClient> {
    /// Open the on-disk store and HTTP client described by `config`.
    pub fn from_config(config: &ChatConfig) -> Result<Self, SessionError> {
        let storage = FileStore::open(config.resolved_data_dir())?;
        let client = ResponseClient::with_config(config.build_client(), config.generation());
        Ok(Self::new(ConversationStore::open(storage), client))
    }
}

impl<S: KeyValueStore, P: CompletionProvider> ChatSession<S, P> {
    pub fn new(store: ConversationStore<S>, client: ResponseClient<P>) -> Self {
        Self { store, client }
    }

    /// Run one full cycle for `text` and return the assistant's reply.
    ///
    /// Order: store the user message, learn facts from it, assemble the
    /// prompt, call the provider, store the reply, then learn facts from the
    /// user text and the reply, each on its own. On failure the user message stays
    /// in history and nothing else changes.
    pub async fn send(&mut self, text: &str) -> Result<String, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        self.store.add_message(Role::User, text);
        self.learn_from(text);

        let messages = assemble(&self.store);
        debug!(messages = messages.len(), "assembled prompt");

        let reply = self.client.get_response(messages).await?;

        self.store.add_message(Role::Assistant, reply.as_str());
        for part in [text, reply.as_str()] {
            self.learn_from(part);
        }

        Ok(reply)
    }

    /// Like [`send`](Self::send), but returns [`FALLBACK_REPLY`] instead of
    /// an error.
    pub async fn reply_or_fallback(&mut self, text: &str) -> String {
        match self.send(text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "chat cycle failed");
                FALLBACK_REPLY.to_string()
            }
        }
    }

    pub fn store(&self) -> &ConversationStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConversationStore<S> {
        &mut self.store
    }

    pub fn client(&self) -> &ResponseClient<P> {
        &self.client
    }

    /// Forget the conversation and everything learned.
    pub fn clear(&mut self) {
        self.store.clear_memory();
    }

    /// Split back into store and client.
    pub fn into_parts(self) -> (ConversationStore<S>, ResponseClient<P>) {
        (self.store, self.client)
    }

    fn learn_from(&mut self, text: &str) {
        let update = extract(text);
        if !update.is_empty() {
            self.store.update_user_info(update);
        }
    }
}
