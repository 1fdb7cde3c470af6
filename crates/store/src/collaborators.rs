//! Seams to systems Chat Night reads from but does not own.
//!
//! [`ChatNightStore`] implements all of them so a single process can run
//! self-contained; deployments can swap in adapters for the real profile
//! service or messaging system.

use crate::models::{ChatThread, UserProfile};
use crate::repo::ChatNightStore;
use crate::StoreError;

/// Read-only view of user profiles.
pub trait ProfileDirectory: Send + Sync {
    fn find_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;
}

/// Messaging threads, one per unlocked match.
pub trait ThreadStore: Send + Sync {
    fn find_thread(&self, match_id: &str) -> Result<Option<ChatThread>, StoreError>;

    /// Must fail with [`StoreError::AlreadyExists`] when the match already
    /// has a thread.
    fn create_thread(&self, thread: &ChatThread) -> Result<(), StoreError>;
}

/// Operator-editable runtime settings.
pub trait ConfigLookup: Send + Sync {
    fn lookup(&self, key: &str) -> Result<Option<String>, StoreError>;
}

impl ProfileDirectory for ChatNightStore {
    fn find_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        self.profile(user_id)
    }
}

impl ThreadStore for ChatNightStore {
    fn find_thread(&self, match_id: &str) -> Result<Option<ChatThread>, StoreError> {
        self.thread(match_id)
    }

    fn create_thread(&self, thread: &ChatThread) -> Result<(), StoreError> {
        self.insert_thread(thread)
    }
}

impl ConfigLookup for ChatNightStore {
    fn lookup(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.config_value(key)
    }
}
