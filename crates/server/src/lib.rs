//! Chat Night Server - HTTP REST API for the Chat Night matchmaking engine
//!
//! This crate exposes [`matchmaker::ChatNight`] over HTTP. It supports:
//!
//! - **Session**: Window status, idempotent enter, leave
//! - **Rooms**: My-room and room detail views, mutual engagement
//! - **Threads**: Chat threads for unlocked matches, created on read when missing
//! - **Health & Metrics**: Liveness/readiness probes and Prometheus-compatible metrics
//!
//! # Features
//!
//! - **Identity**: Caller id from the upstream gateway (`x-user-id` or bearer)
//! - **Rate limiting**: Per-user fixed window on enter and engage
//! - **Middleware**: Compression, CORS, request ID tracking, structured logging
//! - **Configuration**: Environment variable and file-based configuration
//! - **Storage**: In-memory or redb-backed persistence
//! - **Graceful Shutdown**: Proper signal handling for production deployments
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! ## Public Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics
//!
//! ## Caller Endpoints (identity required)
//!
//! - `GET /chat-night/status` - Window, passes, active room, queue membership
//! - `POST /chat-night/enter` - Join matchmaking
//! - `POST /chat-night/leave` - Leave both waiting pools
//! - `GET /chat-night/my-room` - Current room, or `{"state": "none"}`
//! - `GET /chat-night/room/{room_id}` - Room detail
//! - `POST /chat-night/engage` - Engage in a room
//! - `GET /chat/threads` - Threads for unlocked matches
//!
//! ## Admin Endpoints (API key required)
//!
//! - `POST /admin/chat-night/grant` - Add passes for today

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{ServerConfig, StorageBackend, StorageConfig};
pub use error::{ServerError, ServerResult};
pub use middleware::{CallerId, USER_ID_HEADER};
pub use server::{build_router, start_server};
pub use state::ServerState;
