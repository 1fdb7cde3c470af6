//! Workspace umbrella crate for Chat Night.
//!
//! This crate stitches together the window policy, candidate scoring, the
//! record store and the matchmaking engine so callers can embed the whole
//! session behind a single dependency. The HTTP surface lives in the
//! `chatnight-server` crate.
//!
//! ```
//! use chatnight::{open_chat_night, BackendConfig, ChatNightConfig};
//!
//! let engine = open_chat_night(&BackendConfig::in_memory(), ChatNightConfig::default())?;
//! assert_eq!(engine.config().passes.man_passes, 1);
//! # Ok::<(), chatnight::SetupError>(())
//! ```

pub use matchmaker::{
    ChatNight, ChatNightBuilder, ChatNightConfig, ChatNightEvent, ConfigError, EVENT_ENGAGE,
    EVENT_ENTER, EVENT_MATCH, EVENT_UNLOCKED, EngageStatus, EngageView, EnterOutcome, EventSink,
    GateConfig, LastMessage, LeaveView, MatchAlgorithm, MatchingConfig, MatchmakerError,
    MatchmakerMetrics, MemoryEventSink, MyRoomDetails, MyRoomView, PassConfig, ProfileStrength,
    QueueStatus, RoomView, StatusView, StrengthTier, ThreadPartner, ThreadSummary,
    TracingEventSink, WindowState, compute_profile_strength, set_matchmaker_metrics,
};
pub use schedule::{
    Clock, ManualClock, PhoneWhitelist, SystemClock, WindowConfig, WindowPolicy, WindowStatus,
    day_key,
};
pub use scoring::{CandidateProfile, RankedCandidate, ReasonTag, pick_best, rank};
pub use store::{
    BackendConfig, Category, ChatNightStore, ChatThread, ConfigLookup, PassEntry,
    ProfileDirectory, Prompt, Room, RoomState, StoreError, ThreadStore, UnlockedMatch,
    UserProfile,
};

use std::sync::Arc;

use thiserror::Error;

/// Failures while assembling an engine.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("store unavailable: {0}")]
    Store(#[from] StoreError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Open the configured backend and build an engine over it with the system
/// clock and the tracing event sink.
pub fn open_chat_night(
    backend: &BackendConfig,
    config: ChatNightConfig,
) -> Result<ChatNight, SetupError> {
    let store = Arc::new(ChatNightStore::new(backend)?);
    tracing::debug!(backend = ?backend, "chat night store opened");
    Ok(ChatNight::new(store, config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_config() {
        let mut config = ChatNightConfig::default();
        config.gate.min_completion = 101;
        assert!(matches!(
            open_chat_night(&BackendConfig::in_memory(), config),
            Err(SetupError::Config(_))
        ));
    }

    #[cfg(feature = "redb")]
    #[test]
    fn opens_redb_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatnight.redb");
        let engine = open_chat_night(
            &BackendConfig::redb(path.display().to_string()),
            ChatNightConfig::default(),
        )
        .unwrap();
        assert!(engine.store().rooms().unwrap().is_empty());
    }
}
