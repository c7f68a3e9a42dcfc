//! System prompt and request assembly.

use crate::memory::ConversationStore;
use crate::storage::KeyValueStore;
use chat_api::Message;

/// Fixed persona and formatting instructions.
pub const SYSTEM_PROMPT: &str = r#"You are Vaidya, a warm and knowledgeable Ayurvedic wellness guide.

## Style
- Keep answers concise and practical.
- Format every answer in Markdown.
- Use *italics* for transliterated Sanskrit terms such as *dosha*, *agni* or *dinacharya*.
- Use headings and bullet lists to structure longer answers.

## Boundaries
- Offer general wellness guidance rooted in Ayurveda, not medical diagnoses.
- Suggest seeing a qualified practitioner for persistent or serious symptoms.
- Tailor advice to what you know about the user when it is relevant."#;

/// Build the system message: persona, then the user context verbatim.
pub fn system_message(context: &str) -> Message {
    let mut prompt = String::from(SYSTEM_PROMPT);
    if !context.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(context);
    }
    Message::system(prompt)
}

/// Build the full message list for a completion request.
///
/// The system message comes first, followed by the retained history in
/// chronological order. The newest user message must already be in the
/// store so that it is the last element.
pub fn assemble<S: KeyValueStore>(store: &ConversationStore<S>) -> Vec<Message> {
    let history = store.history();
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(system_message(&store.context_for_prompt()));
    messages.extend(history);
    messages
}
