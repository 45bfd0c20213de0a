//! Document ingestion: loading, chunking and the upload pipeline

mod chunker;
mod loader;
mod pipeline;

pub use chunker::TextChunker;
pub use loader::DocumentLoader;
pub use pipeline::{IngestPipeline, UploadedFile};
