//! Multipart upload endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::ingestion::UploadedFile;
use crate::server::state::AppState;
use crate::types::UploadResponse;

/// Multipart field carrying files
const FILES_FIELD: &str = "files";

/// POST /upload - index one or more files
///
/// Each file is written to a temporary path with its original extension so the
/// loader picks the right format. The temporary files are removed when this
/// handler returns, whether or not ingest succeeded.
pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut temp_files: Vec<NamedTempFile> = Vec::new();
    let mut uploads: Vec<UploadedFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidRequest("Uploaded file has no filename".to_string()))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidRequest(format!("Failed to read '{}': {}", filename, e)))?;

        tracing::info!("Received file: {} ({} bytes)", filename, data.len());

        let size = data.len() as u64;
        let suffix = Path::new(&filename)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let temp = tokio::task::spawn_blocking(move || -> Result<NamedTempFile> {
            let mut temp = tempfile::Builder::new().suffix(&suffix).tempfile()?;
            temp.write_all(&data)?;
            temp.flush()?;
            Ok(temp)
        })
        .await??;

        uploads.push(UploadedFile {
            original_filename: filename,
            path: temp.path().to_path_buf(),
            size,
        });
        temp_files.push(temp);
    }

    if uploads.is_empty() {
        return Err(Error::InvalidRequest("No files uploaded".to_string()));
    }

    let response = state.pipeline().ingest(uploads).await;
    drop(temp_files);
    Ok(Json(response?))
}
