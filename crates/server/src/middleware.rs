use crate::error::ServerError;
use crate::state::ServerState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

/// Header carrying the authenticated user id, set by the upstream gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity, available to handlers as an `Extension`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerId(pub String);

/// Request id, stored in request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
}

/// Caller identity middleware
///
/// Authentication happens upstream; this only trusts `x-user-id` or
/// `Authorization: Bearer <user-id>`.
pub async fn user_identity(mut request: Request, next: Next) -> Result<Response, ServerError> {
    let caller = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| bearer(request.headers()))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    match caller {
        Some(user_id) => {
            request.extensions_mut().insert(CallerId(user_id));
            Ok(next.run(request).await)
        }
        None => Err(ServerError::Authentication(
            "Caller identity required. Provide it in 'X-User-Id' or 'Authorization: Bearer <user-id>' header"
                .to_string(),
        )),
    }
}

/// API key authentication middleware for the admin routes
pub async fn api_key_auth(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let api_key = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .or_else(|| bearer(request.headers()));

    match api_key {
        Some(key) if state.is_valid_api_key(key) => Ok(next.run(request).await),
        Some(_) => Err(ServerError::Authentication("Invalid API key".to_string())),
        None => Err(ServerError::Authentication(
            "API key required. Provide it in 'X-API-Key' or 'Authorization: Bearer <key>' header"
                .to_string(),
        )),
    }
}

/// Request ID injection middleware
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}

/// Metric label for a request path. Room ids are collapsed.
pub fn route_label(path: &str) -> String {
    match path.strip_prefix("/chat-night/room/") {
        Some(_) => "/chat-night/room/{room_id}".to_string(),
        None => path.to_string(),
    }
}

/// Logging middleware
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let route = route_label(uri.path());
    let start = std::time::Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let caller = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        route = %route,
        status = %status,
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        user_id = %caller,
        "Request completed"
    );
    crate::metrics::record_http(&route, status.as_u16(), duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_paths_share_a_label() {
        assert_eq!(route_label("/chat-night/room/abc"), "/chat-night/room/{room_id}");
        assert_eq!(route_label("/chat-night/status"), "/chat-night/status");
    }

    #[test]
    fn bearer_is_stripped() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer user-7"));
        assert_eq!(bearer(&headers), Some("user-7"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer(&headers), None);
    }
}
