//! Shared application state for the HTTP server

use std::sync::Arc;
use std::time::Duration;

use crate::config::{BackendProvider, RagConfig};
use crate::conversation::{ConversationStore, InMemoryConversationStore};
use crate::error::Result;
use crate::ingestion::{IngestPipeline, TextChunker};
use crate::orchestrator::RagOrchestrator;
use crate::providers::{ChatModel, EmbeddingProvider, OllamaClient, OpenAiClient, VectorStoreProvider};
use crate::retrieval::VectorIndex;
use crate::storage::SqliteVectorStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    index: Arc<VectorIndex>,
    pipeline: IngestPipeline,
    orchestrator: RagOrchestrator,
    conversations: Arc<dyn ConversationStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn ChatModel>,
}

impl AppState {
    /// Build the providers named by the configuration and wire them together
    pub fn from_config(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing application state (backend: {:?})", config.backend);

        let (embedder, llm): (Arc<dyn EmbeddingProvider>, Arc<dyn ChatModel>) = match config.backend {
            BackendProvider::Ollama => {
                let client = Arc::new(OllamaClient::new(&config.llm)?);
                (client.clone(), client)
            }
            BackendProvider::OpenAi => {
                let client = Arc::new(OpenAiClient::new(&config.llm)?);
                (client.clone(), client)
            }
        };
        tracing::info!(
            "Using {} (embeddings: {}, generation: {})",
            llm.name(),
            config.llm.embed_model,
            llm.model()
        );

        let store = Arc::new(SqliteVectorStore::new(
            &config.vector_db.storage_path,
            &config.vector_db.collection_name,
        )?);
        tracing::info!(
            "Vector store at {} (collection '{}')",
            config.vector_db.storage_path.display(),
            config.vector_db.collection_name
        );

        let conversations = Arc::new(InMemoryConversationStore::new(
            config.sessions.ttl_secs.map(Duration::from_secs),
        ));

        Self::from_parts(config, embedder, llm, store, conversations)
    }

    /// Wire pre-built providers together
    pub fn from_parts(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn ChatModel>,
        store: Arc<dyn VectorStoreProvider>,
        conversations: Arc<dyn ConversationStore>,
    ) -> Result<Self> {
        let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;

        let index = Arc::new(
            VectorIndex::new(Arc::clone(&embedder), store)
                .with_min_similarity(config.retrieval.min_similarity),
        );
        let pipeline = IngestPipeline::new(chunker, Arc::clone(&index));
        let orchestrator = RagOrchestrator::new(
            Arc::clone(&index),
            Arc::clone(&llm),
            Arc::clone(&conversations),
        )
        .with_default_k(config.retrieval.max_context_docs)
        .with_history_messages(config.retrieval.history_messages);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                index,
                pipeline,
                orchestrator,
                conversations,
                embedder,
                llm,
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.inner.index
    }

    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    pub fn orchestrator(&self) -> &RagOrchestrator {
        &self.inner.orchestrator
    }

    pub fn conversations(&self) -> &Arc<dyn ConversationStore> {
        &self.inner.conversations
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    pub fn llm(&self) -> &Arc<dyn ChatModel> {
        &self.inner.llm
    }
}
