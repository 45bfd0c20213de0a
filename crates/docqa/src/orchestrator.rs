//! Retrieval-augmented answering for one chat request
//!
//! Each request runs retrieve, format context, format history, generate, update
//! history and respond in that order. Any failure ends the request with no
//! partial response.

use std::sync::Arc;

use crate::conversation::ConversationStore;
use crate::error::{Error, Result};
use crate::generation::{build_citations, PromptBuilder};
use crate::providers::ChatModel;
use crate::retrieval::VectorIndex;
use crate::types::{ChatQuery, ChatResponse};

/// Answers questions over the indexed documents with per-session history
pub struct RagOrchestrator {
    index: Arc<VectorIndex>,
    llm: Arc<dyn ChatModel>,
    conversations: Arc<dyn ConversationStore>,
    default_k: usize,
    history_messages: usize,
}

impl RagOrchestrator {
    pub fn new(
        index: Arc<VectorIndex>,
        llm: Arc<dyn ChatModel>,
        conversations: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            index,
            llm,
            conversations,
            default_k: 6,
            history_messages: 6,
        }
    }

    /// Number of chunks retrieved when the query gives no `k`
    pub fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k;
        self
    }

    /// Number of most recent messages rendered into the prompt
    pub fn with_history_messages(mut self, n: usize) -> Self {
        self.history_messages = n;
        self
    }

    pub fn conversations(&self) -> &Arc<dyn ConversationStore> {
        &self.conversations
    }

    /// Answer a question with citations
    pub async fn answer(&self, query: ChatQuery) -> Result<ChatResponse> {
        let question = query.question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }

        let k = query.k.filter(|k| *k > 0).unwrap_or(self.default_k);
        tracing::info!(
            "Chat [{}]: {}",
            query.session_id,
            question.chars().take(100).collect::<String>()
        );

        let chunks = self
            .index
            .search(question, k, query.documents.as_deref())
            .await?;
        tracing::debug!("Retrieved {} chunk(s) for k={}", chunks.len(), k);

        let context = PromptBuilder::format_context(&chunks);
        let history = self
            .conversations
            .recent(&query.session_id, self.history_messages)
            .await?;
        let history = PromptBuilder::format_history(&history);

        let messages = PromptBuilder::build_messages(&context, question, &history);
        let answer = self.llm.generate(&messages).await?;

        self.conversations
            .append_user(&query.session_id, question)
            .await?;
        self.conversations
            .append_assistant(&query.session_id, &answer)
            .await?;

        let citations = build_citations(&chunks);
        tracing::debug!("Answer built with {} citation(s)", citations.len());

        Ok(ChatResponse { answer, citations })
    }
}
