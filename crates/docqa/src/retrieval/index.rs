//! Vector index: embedding plus storage behind one add/search interface

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorRecord, VectorSearchResult, VectorStoreProvider};
use crate::types::{keys, Chunk, DocumentListResponse, DocumentSummary};

/// Name used in listings for chunks without any source metadata
const UNKNOWN_DOCUMENT: &str = "Unknown";

/// Wraps an embedding provider and a vector store.
///
/// The embedding provider is called exactly once per `add` or `search`; its
/// errors are returned unchanged and nothing is retried.
pub struct VectorIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    min_similarity: Option<f32>,
}

impl VectorIndex {
    /// Create a new index
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStoreProvider>) -> Self {
        Self {
            embedder,
            store,
            min_similarity: None,
        }
    }

    /// Drop search results scoring below `threshold`
    pub fn with_min_similarity(mut self, threshold: Option<f32>) -> Self {
        self.min_similarity = threshold;
        self
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    pub fn store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.store
    }

    /// Embed and store chunks, returning the assigned ids in order
    pub async fn add(&self, chunks: &[Chunk]) -> Result<Vec<String>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "Embedding provider returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let records = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| VectorRecord {
                content: chunk.content.clone(),
                metadata: chunk.metadata.clone(),
                embedding,
            })
            .collect();

        let ids = self.store.insert(records).await?;
        tracing::debug!("Indexed {} chunks into {}", ids.len(), self.store.name());
        Ok(ids)
    }

    /// Chunks most similar to `query`, best first, at most `k`.
    ///
    /// With a non-empty `source_filter`, only chunks whose `source` is in the set
    /// are eligible, regardless of how similar other chunks are.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        source_filter: Option<&[String]>,
    ) -> Result<Vec<Chunk>> {
        Ok(self
            .search_scored(query, k, source_filter)
            .await?
            .into_iter()
            .map(|r| r.chunk)
            .collect())
    }

    /// Like [`VectorIndex::search`] but keeps ids and similarity scores
    pub async fn search_scored(
        &self,
        query: &str,
        k: usize,
        source_filter: Option<&[String]>,
    ) -> Result<Vec<VectorSearchResult>> {
        let source_filter = source_filter.filter(|f| !f.is_empty());
        let embedding = self.embedder.embed(query).await?;
        let mut results = self.store.search(&embedding, k, source_filter).await?;

        if let Some(threshold) = self.min_similarity {
            let before = results.len();
            results.retain(|r| r.similarity >= threshold);
            if results.len() < before {
                tracing::debug!(
                    "Dropped {} results below similarity {}",
                    before - results.len(),
                    threshold
                );
            }
        }

        Ok(results)
    }

    /// Group stored chunks by document name
    pub async fn list_documents(&self) -> Result<DocumentListResponse> {
        let entries = self.store.entries().await?;
        let total_chunks = entries.len();

        let mut documents: Vec<DocumentSummary> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for entry in &entries {
            let meta = &entry.metadata;
            let name = meta.document_name().unwrap_or(UNKNOWN_DOCUMENT).to_string();

            let pos = *positions.entry(name.clone()).or_insert_with(|| {
                documents.push(DocumentSummary {
                    filename: name,
                    upload_id: meta.get_str(keys::UPLOAD_ID).map(str::to_string),
                    upload_timestamp: meta.get_i64(keys::UPLOAD_TIMESTAMP),
                    file_type: meta.get_str(keys::FILE_TYPE).map(str::to_string),
                    file_size: meta.get_i64(keys::FILE_SIZE).unwrap_or(0),
                    chunks: 0,
                });
                documents.len() - 1
            });
            documents[pos].chunks += 1;
        }

        Ok(DocumentListResponse {
            total_documents: documents.len(),
            total_chunks,
            documents,
        })
    }

    /// Delete every chunk of a document, matched on its uploaded name or `source`
    pub async fn delete_document(&self, name: &str) -> Result<usize> {
        let ids: Vec<String> = self
            .store
            .entries()
            .await?
            .into_iter()
            .filter(|e| e.metadata.document_name() == Some(name))
            .map(|e| e.id)
            .collect();

        if ids.is_empty() {
            return Err(Error::DocumentNotFound(name.to_string()));
        }

        let deleted = self.store.delete(&ids).await?;
        tracing::info!("Deleted document '{}' ({} chunks)", name, deleted);
        Ok(deleted)
    }

    /// Delete every stored chunk; an empty store yields 0
    pub async fn delete_all(&self) -> Result<usize> {
        let deleted = self.store.clear().await?;
        tracing::info!("Deleted all documents ({} chunks)", deleted);
        Ok(deleted)
    }

    /// Total stored chunks
    pub async fn len(&self) -> Result<usize> {
        self.store.len().await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        self.store.is_empty().await
    }
}
