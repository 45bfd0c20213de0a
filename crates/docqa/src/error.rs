//! Error types for the document Q&A service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for docqa operations
pub type Result<T> = std::result::Result<T, Error>;

/// Service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A file could not be loaded or decoded
    #[error("Failed to load file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Embedding service failure (rate limit, network, auth)
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Generation model failure
    #[error("LLM error: {0}")]
    Llm(String),

    /// Vector store unreachable or corrupt
    #[error("Vector database error: {0}")]
    VectorDb(String),

    /// Question was empty after trimming
    #[error("Question cannot be empty")]
    EmptyQuestion,

    /// Malformed request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Deletion by name matched no chunks
    #[error("Document '{0}' not found")]
    DocumentNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file load error tagged with the file path
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector db error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::FileParse { .. } => "load_error",
            Error::Embedding(_) => "embedding_error",
            Error::Llm(_) => "llm_error",
            Error::VectorDb(_) => "vector_db_error",
            Error::EmptyQuestion => "empty_question",
            Error::InvalidRequest(_) => "invalid_request",
            Error::DocumentNotFound(_) => "not_found",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Http(_) => "http_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// HTTP status used when this error reaches the transport
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::EmptyQuestion | Error::InvalidRequest(_) | Error::FileParse { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::DocumentNotFound(_) => StatusCode::NOT_FOUND,
            Error::Llm(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_)
            | Error::Embedding(_)
            | Error::VectorDb(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::VectorDb(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("Task join error: {}", err))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::EmptyQuestion.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::DocumentNotFound("a.pdf".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(Error::llm("down").status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            Error::vector_db("corrupt").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_file_parse_message_names_file() {
        let err = Error::file_parse("/tmp/abc.pdf", "bad xref");
        assert_eq!(err.to_string(), "Failed to load file '/tmp/abc.pdf': bad xref");
        assert_eq!(err.kind(), "load_error");
    }
}
