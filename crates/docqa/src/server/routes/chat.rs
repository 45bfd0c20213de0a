//! Chat endpoint

use axum::{extract::State, Form, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{ChatForm, ChatQuery, ChatResponse};

/// POST /chat - answer a question over the indexed documents
pub async fn chat(
    State(state): State<AppState>,
    Form(form): Form<ChatForm>,
) -> Result<Json<ChatResponse>> {
    let query = ChatQuery::try_from(form)?;
    let response = state.orchestrator().answer(query).await?;
    Ok(Json(response))
}
