//! docqa: question answering over uploaded documents with source citations
//!
//! Files are loaded into text units, split into overlapping chunks, embedded and
//! stored in a SQLite-backed vector index. Questions retrieve the most similar
//! chunks, which are handed to a chat model together with the session's recent
//! history. Answers come back with deduplicated citations.

pub mod config;
pub mod conversation;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod orchestrator;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use orchestrator::RagOrchestrator;
pub use types::{
    document::{Chunk, DocumentFormat, TextUnit},
    metadata::Metadata,
    query::ChatQuery,
    response::{ChatResponse, Citation, UploadResponse},
};
