//! API route handlers
//!
//! Routes are organized by functionality:
//!
//! - `health`: Health checks, readiness, and metrics
//! - `chat_night`: The matchmaking session (status, enter, leave, rooms, engage)
//! - `chat`: Chat threads for unlocked matches
//! - `admin`: Operator actions behind an API key

pub mod admin;
pub mod chat;
pub mod chat_night;
pub mod health;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
///
/// Root endpoint (GET /), no identity required.
///
/// # Response
///
/// ```json
/// {
///   "name": "Chat Night Server",
///   "version": "0.1.0",
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Chat Night Server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/chat-night/status",
            "/chat-night/enter",
            "/chat-night/leave",
            "/chat-night/my-room",
            "/chat-night/room/{room_id}",
            "/chat-night/engage",
            "/chat/threads",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
