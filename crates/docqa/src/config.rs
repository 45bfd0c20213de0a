//! Configuration for the document Q&A service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Backend used for embeddings and generation
    pub backend: BackendProvider,
    /// Server configuration
    pub server: ServerConfig,
    /// LLM and embedding model configuration
    pub llm: LlmConfig,
    /// Vector database configuration
    pub vector_db: VectorDbConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Conversation session configuration
    pub sessions: SessionConfig,
}

/// Which service family provides embeddings and generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// OpenAI or any OpenAI-compatible endpoint
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

impl FromStr for BackendProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(Error::Config(format!("Unknown backend '{}'", other))),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024,
        }
    }
}

/// Model endpoints and names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL override. Defaults per backend when unset.
    pub base_url: Option<String>,
    /// API key (required for the OpenAI backend)
    pub api_key: Option<String>,
    /// Generation model name
    pub generate_model: String,
    /// Embedding model name
    pub embed_model: String,
    /// Sampling temperature; answers are expected to be deterministic
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            generate_model: "gpt-4o-mini".to_string(),
            embed_model: "text-embedding-3-small".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    /// Base URL for the given backend, honoring an explicit override
    pub fn base_url_for(&self, backend: BackendProvider) -> String {
        let url = match (&self.base_url, backend) {
            (Some(url), _) => url.clone(),
            (None, BackendProvider::OpenAi) => "https://api.openai.com/v1".to_string(),
            (None, BackendProvider::Ollama) => "http://localhost:11434".to_string(),
        };
        url.trim_end_matches('/').to_string()
    }
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// SQLite file backing the vector store
    pub storage_path: PathBuf,
    /// Collection that scopes every stored chunk
    pub collection_name: String,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./vector_store/docqa.sqlite"),
            collection_name: "docs".to_string(),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval and context-assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default number of chunks to retrieve when the caller gives no `k`
    pub max_context_docs: usize,
    /// Number of most recent messages included as history
    pub history_messages: usize,
    /// Drop retrieved chunks below this similarity (disabled when unset)
    pub min_similarity: Option<f32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_context_docs: 6,
            history_messages: 6,
            min_similarity: None,
        }
    }
}

/// Conversation session lifetime
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle sessions older than this are evicted. No eviction when unset.
    pub ttl_secs: Option<u64>,
    /// How often the server sweeps expired sessions
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: None,
            sweep_interval_secs: 300,
        }
    }
}

impl RagConfig {
    /// Load configuration: defaults, then an optional TOML file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LLM_BACKEND") {
            self.backend = v.parse()?;
        }
        if let Some(v) = lookup("OPENAI_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = lookup("OPENAI_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Some(v) = lookup("OPENAI_MODEL") {
            self.llm.generate_model = v;
        }
        if let Some(v) = lookup("EMBEDDING_MODEL") {
            self.llm.embed_model = v;
        }
        if let Some(v) = lookup("VECTOR_STORE_PATH") {
            self.vector_db.storage_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("COLLECTION_NAME") {
            self.vector_db.collection_name = v;
        }
        if let Some(v) = lookup("CHUNK_SIZE") {
            self.chunking.chunk_size = parse_env("CHUNK_SIZE", &v)?;
        }
        if let Some(v) = lookup("CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = parse_env("CHUNK_OVERLAP", &v)?;
        }
        if let Some(v) = lookup("MAX_CONTEXT_DOCS") {
            self.retrieval.max_context_docs = parse_env("MAX_CONTEXT_DOCS", &v)?;
        }
        if let Some(v) = lookup("SESSION_TTL_SECS") {
            self.sessions.ttl_secs = Some(parse_env("SESSION_TTL_SECS", &v)?);
        }
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = parse_env("PORT", &v)?;
        }
        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.max_context_docs == 0 {
            return Err(Error::Config("max_context_docs must be positive".to_string()));
        }
        if self.retrieval.history_messages == 0 {
            return Err(Error::Config("history_messages must be positive".to_string()));
        }
        if self.backend == BackendProvider::OpenAi && self.llm.api_key.is_none() {
            return Err(Error::Config(
                "OPENAI_API_KEY is required for the openai backend".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} has invalid value '{}'", key, value)))
}
