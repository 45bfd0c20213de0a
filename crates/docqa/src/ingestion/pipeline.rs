//! Upload ingest pipeline: load, chunk and index a batch of files

use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::retrieval::VectorIndex;
use crate::types::{keys, Chunk, Metadata, UploadFailure, UploadResponse};

use super::{DocumentLoader, TextChunker};

/// A file received by the transport and saved to a readable local path
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Name the user uploaded the file under
    pub original_filename: String,
    /// Where the bytes live for the duration of the ingest
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
}

/// Turns uploaded files into indexed chunks
pub struct IngestPipeline {
    chunker: TextChunker,
    index: Arc<VectorIndex>,
}

impl IngestPipeline {
    pub fn new(chunker: TextChunker, index: Arc<VectorIndex>) -> Self {
        Self { chunker, index }
    }

    /// Ingest a batch.
    ///
    /// A file that fails to load is reported in `failed` and the rest of the batch
    /// still goes in. Embedding or storage failures abort the whole batch.
    pub async fn ingest(&self, files: Vec<UploadedFile>) -> Result<UploadResponse> {
        let upload_timestamp = chrono::Utc::now().timestamp();
        let mut indexed_files = Vec::new();
        let mut failed = Vec::new();
        let mut chunks: Vec<Chunk> = Vec::new();

        for file in files {
            let metadata = upload_metadata(&file, upload_timestamp);

            let units = match DocumentLoader::load_blocking(file.path.clone(), Some(metadata)).await {
                Ok(units) => units,
                Err(e) => {
                    tracing::warn!("Skipping '{}': {}", file.original_filename, e);
                    failed.push(UploadFailure {
                        filename: file.original_filename,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let file_chunks = self.chunker.chunk_units(&units);
            tracing::info!(
                "Loaded '{}': {} unit(s), {} chunk(s)",
                file.original_filename,
                units.len(),
                file_chunks.len()
            );

            chunks.extend(file_chunks);
            indexed_files.push(file.original_filename);
        }

        self.index.add(&chunks).await?;

        tracing::info!(
            "Indexed {} file(s), {} chunk(s), {} failed",
            indexed_files.len(),
            chunks.len(),
            failed.len()
        );

        Ok(UploadResponse {
            indexed_files,
            chunks: chunks.len(),
            failed,
        })
    }
}

/// Per-file metadata shared by every unit of one upload
fn upload_metadata(file: &UploadedFile, upload_timestamp: i64) -> Metadata {
    let suffix = Uuid::new_v4().simple().to_string();
    let upload_id = format!("{}_{}", upload_timestamp, &suffix[..8]);

    Metadata::new()
        .with(keys::ORIGINAL_FILENAME, file.original_filename.as_str())
        .with(keys::UPLOAD_ID, upload_id)
        .with(keys::UPLOAD_TIMESTAMP, upload_timestamp)
        .with(keys::FILE_SIZE, file.size as i64)
}
