//! Provider abstractions for embeddings, generation and vector storage
//!
//! The orchestrator and index only see these traits, so the Ollama and
//! OpenAI-compatible backends (or test doubles) are interchangeable.

pub mod embedding;
pub mod llm;
pub mod ollama;
pub mod openai;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use llm::{ChatMessage, ChatModel, ChatRole};
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use vector_store::{StoredEntry, VectorRecord, VectorSearchResult, VectorStoreProvider};
