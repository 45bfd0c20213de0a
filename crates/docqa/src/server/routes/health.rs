//! Health endpoint

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::error::Result;
use crate::server::state::AppState;

/// Health report with one entry per external dependency
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub embeddings: String,
    pub vectordb: String,
    pub llm: String,
}

impl HealthChecks {
    fn all_ok(&self) -> bool {
        [&self.embeddings, &self.vectordb, &self.llm]
            .iter()
            .all(|c| c.as_str() == "ok")
    }
}

fn check(result: Result<bool>) -> String {
    match result {
        Ok(true) => "ok".to_string(),
        Ok(false) => "error: unreachable".to_string(),
        Err(e) => format!("error: {}", e),
    }
}

/// GET /health - 200 when every dependency answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (embeddings, vectordb, llm) = tokio::join!(
        state.embedder().health_check(),
        state.index().store().health_check(),
        state.llm().health_check(),
    );

    let checks = HealthChecks {
        embeddings: check(embeddings),
        vectordb: check(vectordb),
        llm: check(llm),
    };

    let healthy = checks.all_ok();
    if !healthy {
        tracing::warn!("Health check failed: {:?}", checks);
    }

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "unhealthy" },
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
            checks,
        }),
    )
}
