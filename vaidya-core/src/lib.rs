//! Conversational core of the Vaidya Ayurvedic wellness assistant.
//!
//! This crate provides:
//! - A bounded, persisted conversation store with structured user facts
//! - Pattern-based fact extraction (dosha, prakruti, diet, agni, ...)
//! - System prompt assembly from stored facts and recent history
//! - A response client over any OpenAI-compatible completion endpoint
//!
//! # Quick Start
//!
//! ```ignore
//! use vaidya_core::{ChatConfig, ChatSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ChatConfig::from_env().with_data_dir("./memory");
//!     let mut session = ChatSession::from_config(&config)?;
//!
//!     let reply = session.send("I am vata and my agni is irregular").await?;
//!     println!("{reply}");
//!     println!("{}", session.store().context_for_prompt());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod extract;
pub mod facts;
pub mod memory;
pub mod prompt;
pub mod respond;
pub mod session;
pub mod storage;
pub mod testing;

// Primary public API
pub use chat_api::Role;
pub use config::ChatConfig;
pub use extract::extract;
pub use facts::{Agni, Dinacharya, Dosha, HealthData, HealthMetrics, Preferences, UserFacts};
pub use memory::{ConversationMemory, ConversationStore, Message, MAX_MESSAGES, STORAGE_KEY};
pub use prompt::{assemble, SYSTEM_PROMPT};
pub use respond::{CompletionProvider, GenerationConfig, ResponseClient, ResponseError};
pub use session::{ChatSession, SessionError, FALLBACK_REPLY};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use testing::{MockFailure, MockProvider, MockReply};
