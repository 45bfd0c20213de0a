//! Core types for the document Q&A service

pub mod document;
pub mod metadata;
pub mod query;
pub mod response;

pub use document::{file_type_of, Chunk, DocumentFormat, TextUnit};
pub use metadata::{keys, Metadata, MetadataValue};
pub use query::{parse_document_filter, ChatForm, ChatQuery, DEFAULT_SESSION_ID};
pub use response::{
    ChatResponse, Citation, DeleteResponse, DocumentListResponse, DocumentSummary,
    UploadFailure, UploadResponse,
};
