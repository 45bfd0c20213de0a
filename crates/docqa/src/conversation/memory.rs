//! In-process conversation store

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::providers::ChatMessage;

use super::ConversationStore;

/// One conversation's full history
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: Instant,
    pub last_active: Instant,
}

impl Session {
    fn new(id: &str) -> Self {
        let now = Instant::now();
        Self {
            id: id.to_string(),
            messages: Vec::new(),
            created_at: now,
            last_active: now,
        }
    }

    fn is_expired(&self, ttl: Option<Duration>, now: Instant) -> bool {
        ttl.is_some_and(|ttl| now.duration_since(self.last_active) > ttl)
    }

    /// Last `n` messages, oldest first
    pub fn recent(&self, n: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }
}

/// Session map held in process memory and lost on restart.
///
/// Without a TTL nothing is ever evicted. With one, a session idle longer than
/// the TTL is removed by [`ConversationStore::evict_expired`] and starts empty
/// if it is touched again before the sweep.
pub struct InMemoryConversationStore {
    sessions: DashMap<String, Session>,
    ttl: Option<Duration>,
}

impl InMemoryConversationStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Run `f` on the live session, resetting it first if it has expired
    fn with_session<T>(&self, session_id: &str, f: impl FnOnce(&mut Session) -> T) -> T {
        let now = Instant::now();
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id));

        if entry.is_expired(self.ttl, now) {
            tracing::debug!("Session '{}' expired, starting fresh", session_id);
            *entry = Session::new(session_id);
        }
        entry.last_active = now;
        f(&mut entry)
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get_or_create(&self, session_id: &str) -> Result<Session> {
        Ok(self.with_session(session_id, |s| s.clone()))
    }

    async fn append(&self, session_id: &str, message: ChatMessage) -> Result<()> {
        self.with_session(session_id, |s| s.messages.push(message));
        Ok(())
    }

    async fn recent(&self, session_id: &str, n: usize) -> Result<Vec<ChatMessage>> {
        let now = Instant::now();
        let Some(session) = self.sessions.get(session_id) else {
            return Ok(Vec::new());
        };
        if session.is_expired(self.ttl, now) {
            return Ok(Vec::new());
        }
        Ok(session.recent(n).to_vec())
    }

    async fn evict_expired(&self) -> Result<usize> {
        if self.ttl.is_none() {
            return Ok(0);
        }

        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired(self.ttl, now));
        let evicted = before.saturating_sub(self.sessions.len());

        if evicted > 0 {
            tracing::info!("Evicted {} idle session(s)", evicted);
        }
        Ok(evicted)
    }

    async fn session_count(&self) -> Result<usize> {
        Ok(self.sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ChatRole;
    use std::sync::Arc;
    use tokio_test::block_on;

    #[test]
    fn test_get_or_create_is_idempotent() {
        let store = InMemoryConversationStore::default();
        block_on(async {
            let first = store.get_or_create("s1").await.unwrap();
            assert!(first.messages.is_empty());
            store.append_user("s1", "hello").await.unwrap();

            let again = store.get_or_create("s1").await.unwrap();
            assert_eq!(again.messages.len(), 1);
            assert_eq!(again.created_at, first.created_at);
            assert_eq!(store.session_count().await.unwrap(), 1);
        });
    }

    #[test]
    fn test_recent_window() {
        let store = InMemoryConversationStore::default();
        block_on(async {
            for i in 0..5 {
                store.append_user("s", &format!("q{}", i)).await.unwrap();
                store.append_assistant("s", &format!("a{}", i)).await.unwrap();
            }

            let recent = store.recent("s", 6).await.unwrap();
            let texts: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
            assert_eq!(texts, vec!["q2", "a2", "q3", "a3", "q4", "a4"]);
            assert_eq!(recent[0].role, ChatRole::User);

            // Full history is retained
            assert_eq!(store.get_or_create("s").await.unwrap().messages.len(), 10);
        });
    }

    #[test]
    fn test_recent_short_and_unknown() {
        let store = InMemoryConversationStore::default();
        block_on(async {
            store.append_user("s", "only").await.unwrap();
            assert_eq!(store.recent("s", 6).await.unwrap().len(), 1);
            assert!(store.recent("nobody", 6).await.unwrap().is_empty());
            assert_eq!(store.session_count().await.unwrap(), 1);
        });
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = InMemoryConversationStore::default();
        block_on(async {
            store.append_user("a", "for a").await.unwrap();
            store.append_user("b", "for b").await.unwrap();
            assert_eq!(store.recent("a", 6).await.unwrap()[0].content, "for a");
            assert_eq!(store.recent("b", 6).await.unwrap()[0].content, "for b");
        });
    }

    #[test]
    fn test_no_ttl_never_evicts() {
        let store = InMemoryConversationStore::new(None);
        block_on(async {
            store.append_user("s", "x").await.unwrap();
            assert_eq!(store.evict_expired().await.unwrap(), 0);
            assert_eq!(store.session_count().await.unwrap(), 1);
        });
    }

    #[test]
    fn test_ttl_eviction() {
        let store = InMemoryConversationStore::new(Some(Duration::from_millis(20)));
        block_on(async {
            store.append_user("old", "x").await.unwrap();
            std::thread::sleep(Duration::from_millis(50));
            store.append_user("fresh", "y").await.unwrap();

            assert!(store.recent("old", 6).await.unwrap().is_empty());
            assert_eq!(store.evict_expired().await.unwrap(), 1);
            assert_eq!(store.session_count().await.unwrap(), 1);
            assert_eq!(store.recent("fresh", 6).await.unwrap().len(), 1);
        });
    }

    #[test]
    fn test_expired_session_restarts_when_touched() {
        let store = InMemoryConversationStore::new(Some(Duration::from_millis(20)));
        block_on(async {
            store.append_user("s", "before").await.unwrap();
            std::thread::sleep(Duration::from_millis(50));
            store.append_user("s", "after").await.unwrap();

            let recent = store.recent("s", 6).await.unwrap();
            assert_eq!(recent.len(), 1);
            assert_eq!(recent[0].content, "after");
        });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends() {
        let store = Arc::new(InMemoryConversationStore::default());
        let mut handles = Vec::new();
        for i in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.append_user("shared", &format!("m{}", i)).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let session = store.get_or_create("shared").await.unwrap();
        assert_eq!(session.messages.len(), 50);
    }
}
