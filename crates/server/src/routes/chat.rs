use crate::error::ServerResult;
use crate::middleware::CallerId;
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::json;
use std::sync::Arc;

/// Threads for the caller's unlocked matches, newest first
///
/// GET /chat/threads
///
/// Missing threads are created on read.
pub async fn threads(
    State(state): State<Arc<ServerState>>,
    Extension(CallerId(user_id)): Extension<CallerId>,
) -> ServerResult<impl IntoResponse> {
    let threads = state.run(move |engine| engine.threads(&user_id)).await?;
    let total = threads.len();
    Ok(Json(json!({
        "threads": threads,
        "total": total,
    })))
}
