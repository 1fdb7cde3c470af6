//! # Chat Night Matchmaker (`matchmaker`)
//!
//! ## Purpose
//!
//! `matchmaker` runs a daily, time-boxed blind-chat session. Users from two
//! categories enter a waiting pool during the evening window, are paired one
//! man with one woman into a five-minute room, and may mutually "engage" to
//! turn the room into a permanent match with a chat thread.
//!
//! It sits on top of `schedule` (clock and window), `scoring` (candidate
//! ranking) and `store` (persistence and collaborator seams).
//!
//! ## Core Types
//!
//! - [`ChatNight`]: the service façade. One method per client operation:
//!   `status`, `enter`, `leave`, `my_room`, `room`, `engage`, `threads`,
//!   plus the administrative `grant_passes`.
//! - [`ChatNightConfig`]: window overrides, pass grants, matching knobs and
//!   the completion gate.
//! - [`PassLedger`]: per-user, per-day quota with lazily re-applied
//!   overrides.
//! - [`MatchQueues`]: the two persisted FIFO pools with atomic claims.
//! - [`RoomManager`]: the `active -> engaged | ended` state machine with
//!   lazy expiry.
//! - [`Matchmaker`]: scored selection with FIFO-with-skip fallback and a
//!   pairing cooldown.
//! - [`MatchBridge`]: exactly-once match records and self-healing threads.
//! - [`MatchmakerError`]: rejections and infrastructure failures, each with
//!   an HTTP status and a stable code.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use chrono::{TimeZone, Utc};
//! use matchmaker::{ChatNight, ChatNightConfig, EnterOutcome};
//! use schedule::ManualClock;
//! use store::{ChatNightStore, UserProfile};
//!
//! let store = Arc::new(ChatNightStore::in_memory());
//! for (id, gender) in [("arjun", "Man"), ("meera", "Woman")] {
//!     store
//!         .put_profile(&UserProfile {
//!             id: id.into(),
//!             first_name: Some(id.into()),
//!             gender: Some(gender.into()),
//!             ..Default::default()
//!         })
//!         .unwrap();
//! }
//!
//! // 21:00 IST
//! let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 2, 13, 15, 30, 0).unwrap()));
//! let engine = ChatNight::builder(store, ChatNightConfig::default())
//!     .with_clock(clock)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(engine.enter("arjun").unwrap(), EnterOutcome::Queued);
//! let EnterOutcome::MatchFound { room_id } = engine.enter("meera").unwrap() else {
//!     panic!("expected a match");
//! };
//! engine.engage(&room_id, "arjun").unwrap();
//! engine.engage(&room_id, "meera").unwrap();
//! assert_eq!(engine.threads("arjun").unwrap().len(), 1);
//! ```

pub mod bridge;
pub mod config;
mod engine;
pub mod error;
pub mod events;
pub mod ledger;
pub mod matching;
pub mod metrics;
pub mod queues;
pub mod rooms;
pub mod strength;
pub mod views;

pub use crate::bridge::{MatchBridge, MATCH_SOURCE};
pub use crate::config::{
    ChatNightConfig, ConfigError, GateConfig, MatchingConfig, PassConfig, WindowConfig,
    MIN_COMPLETION_CONFIG_KEY,
};
pub use crate::engine::{ChatNight, ChatNightBuilder};
pub use crate::error::MatchmakerError;
pub use crate::events::{
    redact_payload, ChatNightEvent, EventSink, EventSinkError, MemoryEventSink, TracingEventSink,
    EVENT_ENGAGE, EVENT_ENTER, EVENT_MATCH, EVENT_UNLOCKED, REDACTED,
};
pub use crate::ledger::{PassHolder, PassLedger, PassPolicy};
pub use crate::matching::{candidate_profile, MatchAlgorithm, Matchmaker, PartnerChoice};
pub use crate::metrics::{set_matchmaker_metrics, MatchmakerMetrics};
pub use crate::queues::MatchQueues;
pub use crate::rooms::{EngageOutcome, RoomManager};
pub use crate::strength::{
    compute_profile_strength, effective_min_completion, GateDecision, ProfileStrength,
    StrengthTier, REQUIRED_PHOTOS,
};
pub use crate::views::{
    EngageStatus, EngageView, EnterOutcome, LastMessage, LeaveView, MyRoomDetails, MyRoomView,
    QueueStatus, RoomView, StatusView, ThreadPartner, ThreadSummary, WindowState,
};
