//! Document listing and deletion

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{DeleteResponse, DocumentListResponse};

/// GET /documents - indexed documents with chunk counts
pub async fn list_documents(State(state): State<AppState>) -> Result<Json<DocumentListResponse>> {
    Ok(Json(state.index().list_documents().await?))
}

/// DELETE /documents/:filename - remove every chunk of one document
pub async fn delete_document(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let chunks_deleted = state.index().delete_document(&filename).await?;

    Ok(Json(DeleteResponse {
        message: format!("Successfully deleted '{}'", filename),
        chunks_deleted,
    }))
}

/// DELETE /documents - remove everything
pub async fn delete_all_documents(State(state): State<AppState>) -> Result<Json<DeleteResponse>> {
    let chunks_deleted = state.index().delete_all().await?;

    let message = if chunks_deleted == 0 {
        "No documents to delete"
    } else {
        "Successfully deleted all documents"
    };

    Ok(Json(DeleteResponse {
        message: message.to_string(),
        chunks_deleted,
    }))
}
