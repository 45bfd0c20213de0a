//! Per-session conversation history

mod memory;

pub use memory::{InMemoryConversationStore, Session};

use async_trait::async_trait;

use crate::error::Result;
use crate::providers::ChatMessage;

/// Storage for session-scoped chat history.
///
/// Appends to one session must be safe under concurrent access. Implementations
/// may be in-process or backed by an external key-value store.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Snapshot of a session, creating an empty one on first reference
    async fn get_or_create(&self, session_id: &str) -> Result<Session>;

    /// Append a message to the end of a session's history
    async fn append(&self, session_id: &str, message: ChatMessage) -> Result<()>;

    async fn append_user(&self, session_id: &str, text: &str) -> Result<()> {
        self.append(session_id, ChatMessage::user(text)).await
    }

    async fn append_assistant(&self, session_id: &str, text: &str) -> Result<()> {
        self.append(session_id, ChatMessage::assistant(text)).await
    }

    /// The last `n` messages in chronological order (fewer if history is shorter)
    async fn recent(&self, session_id: &str, n: usize) -> Result<Vec<ChatMessage>>;

    /// Drop sessions idle past their time-to-live, returning how many were removed
    async fn evict_expired(&self) -> Result<usize>;

    /// Number of live sessions
    async fn session_count(&self) -> Result<usize>;
}
