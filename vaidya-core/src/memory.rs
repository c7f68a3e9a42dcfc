//! Conversation memory for the chat assistant.
//!
//! Keeps a sliding window of recent messages plus the structured facts
//! learned about the user, and writes the whole document back to durable
//! storage after every change.

use crate::facts::UserFacts;
use crate::storage::{KeyValueStore, StorageError};
use chat_api::{Message as WireMessage, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Maximum number of messages retained; older ones are dropped first.
pub const MAX_MESSAGES: usize = 20;

/// Key under which the memory document is persisted.
pub const STORAGE_KEY: &str = "conversation_memory";

/// One stored chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// The `{role, content}` form sent to the model.
    pub fn to_wire(&self) -> WireMessage {
        WireMessage::new(self.role, self.content.clone())
    }
}

/// The persisted unit: recent messages plus user facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMemory {
    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(default)]
    pub user_info: UserFacts,
}

/// Owns the conversation memory and the storage it is persisted to.
///
/// Construct one per user session at the top of the application and pass
/// it by reference to whatever needs it.
#[derive(Debug)]
pub struct ConversationStore<S> {
    memory: ConversationMemory,
    storage: S,
}

impl<S: KeyValueStore> ConversationStore<S> {
    /// Load memory from `storage`.
    ///
    /// A missing entry starts empty. A corrupt or unreadable entry also
    /// starts empty; the problem is logged and not surfaced.
    pub fn open(storage: S) -> Self {
        let memory = match load_memory(&storage) {
            Ok(Some(memory)) => {
                debug!(messages = memory.messages.len(), "loaded conversation memory");
                memory
            }
            Ok(None) => ConversationMemory::default(),
            Err(e) => {
                warn!(error = %e, "discarding unreadable conversation memory");
                ConversationMemory::default()
            }
        };

        Self { memory, storage }
    }

    /// Append a message, drop the oldest beyond [`MAX_MESSAGES`], persist.
    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        self.memory.messages.push(Message::new(role, content));
        self.trim_history();
        self.persist();
    }

    /// Merge a partial update into the stored facts and persist.
    ///
    /// An empty update changes nothing and writes nothing.
    pub fn update_user_info(&mut self, update: UserFacts) {
        if update.is_empty() {
            return;
        }
        self.memory.user_info.merge(update);
        self.persist();
    }

    pub fn user_info(&self) -> &UserFacts {
        &self.memory.user_info
    }

    /// The last `count` messages, oldest first, without timestamps.
    pub fn recent_messages(&self, count: usize) -> Vec<WireMessage> {
        let start = self.memory.messages.len().saturating_sub(count);
        self.memory.messages[start..]
            .iter()
            .map(Message::to_wire)
            .collect()
    }

    /// All retained messages, oldest first, without timestamps.
    pub fn history(&self) -> Vec<WireMessage> {
        self.recent_messages(MAX_MESSAGES)
    }

    /// Bullet summary of known facts for the system prompt.
    pub fn context_for_prompt(&self) -> String {
        self.memory.user_info.render_context()
    }

    /// Forget everything and delete the persisted entry.
    pub fn clear_memory(&mut self) {
        self.memory = ConversationMemory::default();
        match self.storage.remove(STORAGE_KEY) {
            Ok(()) => info!("cleared conversation memory"),
            Err(e) => warn!(error = %e, "failed to remove persisted conversation memory"),
        }
    }

    pub fn message_count(&self) -> usize {
        self.memory.messages.len()
    }

    /// Read-only view of the whole memory document.
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Give the backing storage back, e.g. to reopen it in a fresh store.
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn trim_history(&mut self) {
        let excess = self.memory.messages.len().saturating_sub(MAX_MESSAGES);
        if excess > 0 {
            self.memory.messages.drain(..excess);
        }
    }

    /// Write the full document. Failures are logged and swallowed so a
    /// storage problem never interrupts the chat.
    fn persist(&mut self) {
        let result = serde_json::to_string(&self.memory)
            .map_err(|e| StorageError::Corrupt {
                key: STORAGE_KEY.to_string(),
                reason: e.to_string(),
            })
            .and_then(|json| self.storage.set(STORAGE_KEY, &json));

        if let Err(e) = result {
            warn!(error = %e, "failed to persist conversation memory");
        }
    }
}

fn load_memory<S: KeyValueStore>(storage: &S) -> Result<Option<ConversationMemory>, StorageError> {
    let Some(content) = storage.get(STORAGE_KEY)? else {
        return Ok(None);
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StorageError::Corrupt {
            key: STORAGE_KEY.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{Agni, Dosha, HealthData, Preferences};
    use crate::storage::MemoryStore;

    fn store() -> ConversationStore<MemoryStore> {
        ConversationStore::open(MemoryStore::new())
    }

    fn stored(store: &ConversationStore<MemoryStore>) -> ConversationMemory {
        let json = store.storage().get(STORAGE_KEY).unwrap().unwrap();
        serde_json::from_str(&json).unwrap()
    }

    /// Storage whose writes always fail.
    #[derive(Default)]
    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }

        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn test_memory_creation() {
        let store = store();
        assert_eq!(store.message_count(), 0);
        assert!(store.user_info().is_empty());
        assert_eq!(store.context_for_prompt(), "");
    }

    #[test]
    fn test_add_messages_persists() {
        let mut store = store();
        store.add_message(Role::User, "Namaste");
        store.add_message(Role::Assistant, "Namaste! How can I help?");

        assert_eq!(store.message_count(), 2);
        assert_eq!(stored(&store).messages.len(), 2);
    }

    #[test]
    fn test_trim_history_keeps_most_recent() {
        let mut store = store();
        for i in 0..30 {
            store.add_message(Role::User, format!("Message {i}"));
            assert!(store.message_count() <= MAX_MESSAGES);
        }

        let history = store.history();
        assert_eq!(history.len(), MAX_MESSAGES);
        assert_eq!(history[0].content, "Message 10");
        assert_eq!(history[MAX_MESSAGES - 1].content, "Message 29");
        assert_eq!(stored(&store).messages.len(), MAX_MESSAGES);
    }

    #[test]
    fn test_recent_messages_count() {
        let mut store = store();
        store.add_message(Role::User, "one");
        store.add_message(Role::Assistant, "two");
        store.add_message(Role::User, "three");

        let recent = store.recent_messages(2);
        assert_eq!(
            recent,
            vec![
                WireMessage::assistant("two"),
                WireMessage::user("three"),
            ]
        );
        assert_eq!(store.recent_messages(50).len(), 3);
        assert!(store.recent_messages(0).is_empty());
    }

    #[test]
    fn test_update_user_info_merges() {
        let mut store = store();
        store.update_user_info(UserFacts::with_preferences(Preferences {
            dosha: Some(Dosha::Vata),
            ..Default::default()
        }));
        store.update_user_info(UserFacts::with_health_data(HealthData {
            agni: Some(Agni::Weak),
            ..Default::default()
        }));
        store.update_user_info(UserFacts::with_preferences(Preferences {
            dosha: Some(Dosha::Kapha),
            ..Default::default()
        }));

        let info = store.user_info();
        assert_eq!(info.preferences.as_ref().unwrap().dosha, Some(Dosha::Kapha));
        assert_eq!(info.health_data.as_ref().unwrap().agni, Some(Agni::Weak));
        assert_eq!(&stored(&store).user_info, info);
    }

    #[test]
    fn test_empty_update_does_not_write() {
        let mut store = store();
        store.update_user_info(UserFacts::default());
        assert!(!store.storage().contains(STORAGE_KEY));
        assert!(store.user_info().is_empty());
    }

    #[test]
    fn test_clear_memory_removes_key() {
        let mut store = store();
        store.add_message(Role::User, "I am pitta");
        store.update_user_info(UserFacts::with_preferences(Preferences {
            dosha: Some(Dosha::Pitta),
            ..Default::default()
        }));
        assert!(store.storage().contains(STORAGE_KEY));

        store.clear_memory();
        assert!(store.user_info().is_empty());
        assert!(store.history().is_empty());
        assert!(!store.storage().contains(STORAGE_KEY));
    }

    #[test]
    fn test_corrupt_storage_starts_empty() {
        let mut storage = MemoryStore::new();
        storage.set(STORAGE_KEY, "{not json").unwrap();

        let store = ConversationStore::open(storage);
        assert_eq!(store.message_count(), 0);
        assert!(store.user_info().is_empty());
    }

    #[test]
    fn test_unknown_fact_keys_start_empty() {
        let mut storage = MemoryStore::new();
        storage
            .set(STORAGE_KEY, r#"{"messages": [], "userInfo": {"zodiac": "leo"}}"#)
            .unwrap();

        let store = ConversationStore::open(storage);
        assert!(store.user_info().is_empty());
    }

    #[test]
    fn test_reload_preserves_history() {
        let mut store = store();
        store.add_message(Role::User, "My agni is weak");
        store.add_message(Role::Assistant, "Try warm, cooked foods.");
        let before = store.history();
        let timestamps: Vec<_> = store.memory().messages.iter().map(|m| m.timestamp).collect();

        let reloaded = ConversationStore::open(store.into_storage());
        assert_eq!(reloaded.history(), before);
        let reloaded_timestamps: Vec<_> =
            reloaded.memory().messages.iter().map(|m| m.timestamp).collect();
        assert_eq!(reloaded_timestamps, timestamps);
    }

    #[test]
    fn test_persist_failure_is_swallowed() {
        let mut store = ConversationStore::open(FailingStore);
        store.add_message(Role::User, "still works");
        store.clear_memory();
        assert_eq!(store.message_count(), 0);
    }

    #[test]
    fn test_persisted_shape() {
        let mut store = store();
        store.add_message(Role::User, "hello");

        let json = store.storage().get(STORAGE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hello");
        assert!(value["messages"][0]["timestamp"].is_string());
        assert!(value["userInfo"].is_object());
    }
}
