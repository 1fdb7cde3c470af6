use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

/// Body of `POST /admin/chat-night/grant`
#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub user_id: String,
    pub extra: u32,
}

/// Add passes to a user's ledger entry for today
///
/// POST /admin/chat-night/grant (API key required)
pub async fn grant_passes(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<GrantRequest>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let Json(request) = payload?;
    let user_id = request.user_id.trim().to_string();
    if user_id.is_empty() {
        return Err(ServerError::BadRequest("user_id is required".to_string()));
    }
    if request.extra == 0 {
        return Err(ServerError::BadRequest("extra must be positive".to_string()));
    }

    let extra = request.extra;
    let entry = state
        .run(move |engine| engine.grant_passes(&user_id, extra))
        .await?;
    Ok(Json(entry))
}
