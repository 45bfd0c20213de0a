//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Chunk, Metadata};

/// A chunk paired with its embedding, ready to be stored
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub content: String,
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

/// Search result from vector store
#[derive(Debug, Clone)]
pub struct VectorSearchResult {
    /// Identifier assigned at insert time
    pub id: String,
    /// The matched chunk
    pub chunk: Chunk,
    /// Cosine similarity, higher is more similar
    pub similarity: f32,
}

/// Identifier and metadata of a stored chunk, without content or vector
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub id: String,
    pub metadata: Metadata,
}

/// Trait for vector storage and similarity search
///
/// Implementations must be safe for concurrent insert and search.
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Store records, returning one assigned identifier per record in order
    async fn insert(&self, records: Vec<VectorRecord>) -> Result<Vec<String>>;

    /// Nearest neighbours by descending similarity, at most `top_k`.
    /// With a filter, only chunks whose `source` is in the set are considered.
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        source_filter: Option<&[String]>,
    ) -> Result<Vec<VectorSearchResult>>;

    /// Every stored chunk's identifier and metadata
    async fn entries(&self) -> Result<Vec<StoredEntry>>;

    /// Delete chunks by identifier, returning how many were removed
    async fn delete(&self, ids: &[String]) -> Result<usize>;

    /// Delete every chunk, returning how many were removed
    async fn clear(&self) -> Result<usize> {
        let ids: Vec<String> = self.entries().await?.into_iter().map(|e| e.id).collect();
        self.delete(&ids).await
    }

    /// Get total number of vectors stored
    async fn len(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
