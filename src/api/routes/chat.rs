//! Chat Routes
//!
//! - POST /chat - Broadcast a submission to every connected client

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{ChatRequest, ChatResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// POST /chat
///
/// Broadcasts `"{username}: {message}"` to all open connections.
/// Missing or empty fields are rejected with 400 before anything is sent.
pub async fn submit_chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(req) = payload?;

    tracing::debug!(
        username = ?req.username,
        body = ?req.message,
        "Received chat submission"
    );

    // Fan-out runs in its own task so a panic there becomes a 500, not a
    // dropped connection.
    let broadcaster = Arc::clone(&state.broadcaster);
    let report = tokio::spawn(async move {
        broadcaster
            .submit(req.username.as_deref(), req.message.as_deref())
            .await
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Broadcast task failed: {}", e)))??;

    Ok(Json(ChatResponse {
        status: "ok".to_string(),
        report,
    }))
}
