//! # Chat Night Store
//!
//! Record types and a backend-agnostic store for the Chat Night matchmaking
//! engine.
//!
//! ## Layers
//!
//! - [`StoreBackend`]: a byte-level key-value trait with an atomic
//!   read-modify-write [`update`](StoreBackend::update) and ordered
//!   prefix scans. Two implementations ship:
//!   - [`InMemoryBackend`], a `RwLock<BTreeMap>` for tests and demos.
//!   - `RedbBackend`, a single-file ACID store (feature `backend-redb`).
//! - [`ChatNightStore`]: typed repositories for profiles, passes, rooms,
//!   queues, unlocked matches, threads and runtime config. Records are
//!   JSON encoded.
//! - [`ProfileDirectory`], [`ThreadStore`] and [`ConfigLookup`]: seams to
//!   collaborators the engine reads but does not own.
//!
//! ## Example
//!
//! ```
//! use store::{BackendConfig, Category, ChatNightStore};
//!
//! let store = ChatNightStore::new(&BackendConfig::in_memory()).unwrap();
//! store.modify_queue(Category::Woman, |q| q.push("w1".to_string())).unwrap();
//! assert_eq!(store.queue(Category::Woman).unwrap(), vec!["w1"]);
//! ```

mod backend;
mod collaborators;
mod models;
mod repo;

pub use crate::backend::{BackendConfig, InMemoryBackend, StoreBackend, UpdateFn, VisitFn};
#[cfg(feature = "backend-redb")]
pub use crate::backend::RedbBackend;
pub use crate::collaborators::{ConfigLookup, ProfileDirectory, ThreadStore};
pub use crate::models::{
    Category, ChatThread, PassEntry, Prompt, Room, RoomState, UnlockedMatch, UserProfile,
};
pub use crate::repo::{keys, ChatNightStore};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Serialization encode error: {0}")]
    Encode(String),
    #[error("Serialization decode error: {0}")]
    Decode(String),
    #[error("Record already exists: {0}")]
    AlreadyExists(String),
}

impl StoreError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}
