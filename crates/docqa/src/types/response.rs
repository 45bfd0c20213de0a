//! Response types for chat, upload and document management

use serde::{Deserialize, Serialize};

/// Deduplicated, display-ready reference to a retrieved chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Source filename
    pub source: String,
    /// Page number (if applicable)
    pub page: Option<u32>,
    /// Chunk ordinal within its unit
    pub chunk_id: Option<u32>,
    /// Content truncated for display
    pub snippet: String,
}

/// Answer to a chat question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub citations: Vec<Citation>,
}

/// Result of an upload batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Files that were loaded and indexed, in upload order
    pub indexed_files: Vec<String>,
    /// Total chunks created across all indexed files
    pub chunks: usize,
    /// Files that could not be loaded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<UploadFailure>,
}

/// A file that failed to load during upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadFailure {
    /// Filename that failed
    pub filename: String,
    /// Error message
    pub error: String,
}

/// One indexed document as seen through its stored chunks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub filename: String,
    pub upload_id: Option<String>,
    pub upload_timestamp: Option<i64>,
    pub file_type: Option<String>,
    pub file_size: i64,
    pub chunks: usize,
}

/// Response for listing documents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub total_documents: usize,
    pub total_chunks: usize,
    pub documents: Vec<DocumentSummary>,
}

/// Response for deletions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    pub chunks_deleted: usize,
}
