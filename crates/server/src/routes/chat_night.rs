//! Chat Night session endpoints
//!
//! Every handler reads the caller from the [`CallerId`] extension set by the
//! identity middleware and runs the engine call on the blocking pool.

use crate::error::{ServerError, ServerResult};
use crate::middleware::CallerId;
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use std::sync::Arc;

/// Body of `POST /chat-night/engage`
#[derive(Debug, Deserialize)]
pub struct EngageRequest {
    #[serde(default)]
    pub room_id: Option<String>,
}

/// Window, quota, active room and queue membership for the caller
///
/// GET /chat-night/status
pub async fn status(
    State(state): State<Arc<ServerState>>,
    Extension(CallerId(user_id)): Extension<CallerId>,
) -> ServerResult<impl IntoResponse> {
    let view = state.run(move |engine| engine.status(&user_id)).await?;
    Ok(Json(view))
}

/// Idempotent entry into matchmaking
///
/// POST /chat-night/enter
///
/// # Response
///
/// ```json
/// { "status": "match_found", "room_id": "..." }
/// ```
///
/// `status` is one of `active_room`, `queued` or `match_found`.
pub async fn enter(
    State(state): State<Arc<ServerState>>,
    Extension(CallerId(user_id)): Extension<CallerId>,
) -> ServerResult<impl IntoResponse> {
    state.enforce_rate_limit("enter", &user_id, state.config.enter_rate_limit_per_minute)?;
    let outcome = state.run(move |engine| engine.enter(&user_id)).await?;
    Ok(Json(outcome))
}

/// POST /chat-night/leave
pub async fn leave(
    State(state): State<Arc<ServerState>>,
    Extension(CallerId(user_id)): Extension<CallerId>,
) -> ServerResult<impl IntoResponse> {
    let view = state.run(move |engine| engine.leave(&user_id)).await?;
    Ok(Json(view))
}

/// GET /chat-night/my-room
pub async fn my_room(
    State(state): State<Arc<ServerState>>,
    Extension(CallerId(user_id)): Extension<CallerId>,
) -> ServerResult<impl IntoResponse> {
    let view = state.run(move |engine| engine.my_room(&user_id)).await?;
    Ok(Json(view))
}

/// Room detail; an overdue active room is ended on read.
///
/// GET /chat-night/room/{room_id}
pub async fn room(
    State(state): State<Arc<ServerState>>,
    Extension(CallerId(user_id)): Extension<CallerId>,
    Path(room_id): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let view = state
        .run(move |engine| engine.room(&room_id, &user_id))
        .await?;
    Ok(Json(view))
}

/// POST /chat-night/engage
pub async fn engage(
    State(state): State<Arc<ServerState>>,
    Extension(CallerId(user_id)): Extension<CallerId>,
    payload: Result<Json<EngageRequest>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let Json(request) = payload?;
    state.enforce_rate_limit("engage", &user_id, state.config.engage_rate_limit_per_minute)?;

    let room_id = request
        .room_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ServerError::BadRequest("room_id is required".to_string()))?;

    let view = state
        .run(move |engine| engine.engage(&room_id, &user_id))
        .await?;
    Ok(Json(view))
}
