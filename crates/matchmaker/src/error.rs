//! Error surface of the Chat Night engine.
//!
//! | Variant | Category | HTTP |
//! |---------|----------|------|
//! | [`OnboardingIncomplete`](MatchmakerError::OnboardingIncomplete) | Policy rejection | 400 |
//! | [`WindowClosed`](MatchmakerError::WindowClosed) | Policy rejection | 400 |
//! | [`ProfileGated`](MatchmakerError::ProfileGated) | Policy rejection | 400 |
//! | [`QuotaExhausted`](MatchmakerError::QuotaExhausted) | Policy rejection | 403 |
//! | [`UnknownUser`](MatchmakerError::UnknownUser) | Not found | 404 |
//! | [`RoomNotFound`](MatchmakerError::RoomNotFound) | Not found | 404 |
//! | [`NotParticipant`](MatchmakerError::NotParticipant) | Not authorized | 403 |
//! | [`RoomExpired`](MatchmakerError::RoomExpired) | Stale state | 400 |
//! | [`RoomNotActive`](MatchmakerError::RoomNotActive) | Stale state | 400 |
//! | [`Store`](MatchmakerError::Store) | Infrastructure | 500 |
//! | [`LockPoisoned`](MatchmakerError::LockPoisoned) | Infrastructure | 500 |
//!
//! Every rejection leaves state untouched, except the stale-state variants,
//! which persist the lazy `active -> ended` transition before surfacing.
use store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MatchmakerError {
    #[error("Complete onboarding before using Chat Night")]
    OnboardingIncomplete,

    #[error("Chat Night is closed")]
    WindowClosed,

    #[error("Complete your profile ({required}% required) to use Chat Night")]
    ProfileGated { required: u32 },

    #[error("No passes remaining")]
    QuotaExhausted,

    #[error("User not found: {0}")]
    UnknownUser(String),

    #[error("Room not found")]
    RoomNotFound,

    #[error("Not in room")]
    NotParticipant,

    /// The room was active but past `ends_at`; it has now been ended.
    #[error("Room expired")]
    RoomExpired,

    #[error("Room ended")]
    RoomNotActive,

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),
}

impl MatchmakerError {
    /// Whether the caller, not the service, is at fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            MatchmakerError::Store(_) | MatchmakerError::LockPoisoned(_)
        )
    }

    /// Suggested HTTP status code.
    ///
    /// ```rust
    /// use matchmaker::MatchmakerError;
    ///
    /// assert_eq!(MatchmakerError::QuotaExhausted.http_status_code(), 403);
    /// assert_eq!(MatchmakerError::RoomExpired.http_status_code(), 400);
    /// ```
    pub fn http_status_code(&self) -> u16 {
        match self {
            MatchmakerError::OnboardingIncomplete
            | MatchmakerError::WindowClosed
            | MatchmakerError::ProfileGated { .. }
            | MatchmakerError::RoomExpired
            | MatchmakerError::RoomNotActive => 400,
            MatchmakerError::QuotaExhausted | MatchmakerError::NotParticipant => 403,
            MatchmakerError::UnknownUser(_) | MatchmakerError::RoomNotFound => 404,
            MatchmakerError::Store(_) | MatchmakerError::LockPoisoned(_) => 500,
        }
    }

    /// Stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            MatchmakerError::OnboardingIncomplete => "ONBOARDING_INCOMPLETE",
            MatchmakerError::WindowClosed => "WINDOW_CLOSED",
            MatchmakerError::ProfileGated { .. } => "PROFILE_GATED",
            MatchmakerError::QuotaExhausted => "QUOTA_EXHAUSTED",
            MatchmakerError::UnknownUser(_) => "UNKNOWN_USER",
            MatchmakerError::RoomNotFound => "ROOM_NOT_FOUND",
            MatchmakerError::NotParticipant => "NOT_PARTICIPANT",
            MatchmakerError::RoomExpired => "ROOM_EXPIRED",
            MatchmakerError::RoomNotActive => "ROOM_NOT_ACTIVE",
            MatchmakerError::Store(_) => "STORAGE_ERROR",
            MatchmakerError::LockPoisoned(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_client_copy() {
        assert_eq!(
            MatchmakerError::ProfileGated { required: 60 }.to_string(),
            "Complete your profile (60% required) to use Chat Night"
        );
        assert_eq!(MatchmakerError::QuotaExhausted.to_string(), "No passes remaining");
        assert_eq!(MatchmakerError::RoomNotActive.to_string(), "Room ended");
    }

    #[test]
    fn infrastructure_errors_are_server_side() {
        let err = MatchmakerError::from(StoreError::backend("disk full"));
        assert!(!err.is_client_error());
        assert_eq!(err.http_status_code(), 500);
        assert!(MatchmakerError::NotParticipant.is_client_error());
        assert_eq!(MatchmakerError::NotParticipant.error_code(), "NOT_PARTICIPANT");
    }
}
