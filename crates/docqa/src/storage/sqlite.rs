//! SQLite-backed vector store
//!
//! Chunks are stored per collection with their metadata as JSON and their
//! embedding as a little-endian f32 BLOB. Search is a brute-force cosine scan
//! over the collection, narrowed in SQL when a source filter is given.

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::providers::{StoredEntry, VectorRecord, VectorSearchResult, VectorStoreProvider};
use crate::types::{Chunk, Metadata};

/// Persistent vector store on a single SQLite file
#[derive(Clone)]
pub struct SqliteVectorStore {
    conn: Arc<Mutex<Connection>>,
    collection: String,
}

impl SqliteVectorStore {
    /// Create or open the store at the given path
    pub fn new<P: AsRef<Path>>(path: P, collection: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::vector_db(format!("Failed to open {}: {}", path.display(), e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.into(),
        };

        store.migrate()?;
        tracing::info!(
            "Opened vector store at {} (collection '{}')",
            path.display(),
            store.collection
        );
        Ok(store)
    }

    /// Create an in-memory store (for tests and ephemeral runs)
    pub fn in_memory(collection: impl Into<String>) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::vector_db(format!("Failed to open in-memory database: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.into(),
        };

        store.migrate()?;
        Ok(store)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
        "#,
        )
        .map_err(|e| Error::vector_db(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                source TEXT,
                document_name TEXT,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_collection_source ON chunks(collection, source);
            CREATE INDEX IF NOT EXISTS idx_chunks_collection_document ON chunks(collection, document_name);
        "#,
        )?;

        Ok(())
    }

    fn insert_sync(&self, records: &[VectorRecord]) -> Result<Vec<String>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let now = chrono::Utc::now().to_rfc3339();
        let mut ids = Vec::with_capacity(records.len());

        {
            let mut stmt = tx.prepare(
                "INSERT INTO chunks (id, collection, source, document_name, content, metadata, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;

            for record in records {
                let id = Uuid::new_v4().to_string();
                stmt.execute(params![
                    id,
                    self.collection,
                    record.metadata.source(),
                    record.metadata.document_name(),
                    record.content,
                    serde_json::to_string(&record.metadata)?,
                    vec_to_blob(&record.embedding),
                    now,
                ])?;
                ids.push(id);
            }
        }

        tx.commit()?;
        Ok(ids)
    }

    fn search_sync(
        &self,
        query: &[f32],
        top_k: usize,
        source_filter: Option<&[String]>,
    ) -> Result<Vec<VectorSearchResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();
        let mut sql =
            String::from("SELECT id, content, metadata, embedding FROM chunks WHERE collection = ?");
        let mut args: Vec<&str> = vec![self.collection.as_str()];

        if let Some(sources) = source_filter {
            if sources.is_empty() {
                return Ok(Vec::new());
            }
            let placeholders = vec!["?"; sources.len()].join(", ");
            sql.push_str(&format!(" AND source IN ({})", placeholders));
            args.extend(sources.iter().map(String::as_str));
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Vec<u8>>(3)?,
            ))
        })?;

        let mut scored = Vec::new();
        for row in rows {
            let (id, content, metadata, blob) = row?;
            let similarity = cosine_similarity(query, &blob_to_vec(&blob));
            let metadata: Metadata = serde_json::from_str(&metadata)?;
            scored.push(VectorSearchResult {
                id,
                chunk: Chunk::new(content, metadata),
                similarity,
            });
        }

        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(top_k);
        Ok(scored)
    }

    fn entries_sync(&self) -> Result<Vec<StoredEntry>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT id, metadata FROM chunks WHERE collection = ?1 ORDER BY created_at, rowid")?;
        let rows = stmt.query_map(params![self.collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, metadata) = row?;
            entries.push(StoredEntry {
                id,
                metadata: serde_json::from_str(&metadata)?,
            });
        }
        Ok(entries)
    }

    fn delete_sync(&self, ids: &[String]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut deleted = 0;

        {
            let mut stmt = tx.prepare("DELETE FROM chunks WHERE collection = ?1 AND id = ?2")?;
            for id in ids {
                deleted += stmt.execute(params![self.collection, id])?;
            }
        }

        tx.commit()?;
        Ok(deleted)
    }

    fn clear_sync(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let deleted = conn.execute("DELETE FROM chunks WHERE collection = ?1", params![self.collection])?;
        Ok(deleted)
    }

    fn len_sync(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[async_trait]
impl VectorStoreProvider for SqliteVectorStore {
    async fn insert(&self, records: Vec<VectorRecord>) -> Result<Vec<String>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.insert_sync(&records)).await?
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        source_filter: Option<&[String]>,
    ) -> Result<Vec<VectorSearchResult>> {
        let store = self.clone();
        let query = query_embedding.to_vec();
        let filter = source_filter.map(|f| f.to_vec());

        tokio::task::spawn_blocking(move || store.search_sync(&query, top_k, filter.as_deref())).await?
    }

    async fn entries(&self) -> Result<Vec<StoredEntry>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.entries_sync()).await?
    }

    async fn delete(&self, ids: &[String]) -> Result<usize> {
        let store = self.clone();
        let ids = ids.to_vec();
        tokio::task::spawn_blocking(move || store.delete_sync(&ids)).await?
    }

    async fn clear(&self) -> Result<usize> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.clear_sync()).await?
    }

    async fn len(&self) -> Result<usize> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.len_sync()).await?
    }

    async fn health_check(&self) -> Result<bool> {
        let store = self.clone();
        let ok = tokio::task::spawn_blocking(move || {
            let conn = store.conn.lock();
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).is_ok()
        })
        .await?;
        Ok(ok)
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Cosine similarity; 0.0 for empty, mismatched or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::keys;

    fn record(source: &str, content: &str, embedding: Vec<f32>) -> VectorRecord {
        VectorRecord {
            content: content.to_string(),
            metadata: Metadata::new().with(keys::SOURCE, source),
            embedding,
        }
    }

    #[test]
    fn test_blob_roundtrip() {
        let v = vec![1.0f32, -2.5, 3.125];
        assert_eq!(blob_to_vec(&vec_to_blob(&v)), v);
    }

    #[test]
    fn test_cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_insert_and_search_ordering() {
        let store = SqliteVectorStore::in_memory("docs").unwrap();
        let ids = store
            .insert(vec![
                record("a.txt", "east", vec![1.0, 0.0]),
                record("b.txt", "north", vec![0.0, 1.0]),
                record("c.txt", "north-east", vec![0.7, 0.7]),
            ])
            .await
            .unwrap();
        assert_eq!(ids.len(), 3);

        let results = store.search(&[1.0, 0.1], 2, None).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "east");
        assert_eq!(results[1].chunk.content, "north-east");
        assert!(results[0].similarity >= results[1].similarity);
    }

    #[tokio::test]
    async fn test_search_never_pads() {
        let store = SqliteVectorStore::in_memory("docs").unwrap();
        store.insert(vec![record("a.txt", "only", vec![1.0])]).await.unwrap();

        let results = store.search(&[1.0], 10, None).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_source_filter_beats_similarity() {
        let store = SqliteVectorStore::in_memory("docs").unwrap();
        store
            .insert(vec![
                record("notes.txt", "close", vec![1.0, 0.0]),
                record("report.pdf", "far", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let filter = vec!["report.pdf".to_string()];
        let results = store.search(&[1.0, 0.0], 5, Some(&filter)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.source(), Some("report.pdf"));
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = SqliteVectorStore::in_memory("docs").unwrap();
        let other = SqliteVectorStore {
            conn: Arc::clone(&store.conn),
            collection: "other".to_string(),
        };

        store.insert(vec![record("a.txt", "x", vec![1.0])]).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 1);
        assert!(other.is_empty().await.unwrap());
        assert_eq!(other.clear().await.unwrap(), 0);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let store = SqliteVectorStore::in_memory("docs").unwrap();
        let ids = store
            .insert(vec![
                record("a.txt", "1", vec![1.0]),
                record("a.txt", "2", vec![1.0]),
                record("b.txt", "3", vec![1.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.delete(&ids[..1]).await.unwrap(), 1);
        assert_eq!(store.delete(&ids[..1]).await.unwrap(), 0);
        assert_eq!(store.entries().await.unwrap().len(), 2);

        assert_eq!(store.clear().await.unwrap(), 2);
        assert_eq!(store.clear().await.unwrap(), 0);
        assert!(store.health_check().await.unwrap());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.sqlite");

        {
            let store = SqliteVectorStore::new(&path, "docs").unwrap();
            store.insert_sync(&[record("a.txt", "kept", vec![0.5])]).unwrap();
        }

        let store = SqliteVectorStore::new(&path, "docs").unwrap();
        let entries = store.entries_sync().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].metadata.source(), Some("a.txt"));
    }
}
