//! HTTP routes

pub mod chat;
pub mod documents;
pub mod health;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/upload",
            post(upload::upload_files).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/chat", post(chat::chat))
        .route(
            "/documents",
            get(documents::list_documents).delete(documents::delete_all_documents),
        )
        .route("/documents/:filename", delete(documents::delete_document))
}
