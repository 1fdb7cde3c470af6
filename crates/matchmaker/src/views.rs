//! Response shapes returned by the [`ChatNight`](crate::ChatNight) façade.
//!
//! Every view serializes to the JSON the mobile client already consumes.
use chrono::{DateTime, Utc};
use serde::Serialize;
use store::{Category, Room, RoomState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    Open,
    Closed,
    Gated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Queued,
    None,
}

/// Snapshot for `GET /chat-night/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub is_open: bool,
    pub status: WindowState,
    pub min_completion: u32,
    pub user_completion: u32,
    pub detail: Option<String>,
    pub date_ist: String,
    pub seconds_until_open: i64,
    pub seconds_until_close: i64,
    pub passes_total: u32,
    pub passes_used: u32,
    /// `total - used`; goes negative when usage overran the grant.
    pub passes_remaining: i64,
    pub passes_total_today: u32,
    pub passes_used_today: u32,
    pub passes_remaining_today: i64,
    pub active_room_id: Option<String>,
    pub queue_status: QueueStatus,
}

/// Result of `enter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnterOutcome {
    ActiveRoom { room_id: String },
    Queued,
    MatchFound { room_id: String },
}

impl EnterOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnterOutcome::ActiveRoom { .. } => "active_room",
            EnterOutcome::Queued => "queued",
            EnterOutcome::MatchFound { .. } => "match_found",
        }
    }

    pub fn room_id(&self) -> Option<&str> {
        match self {
            EnterOutcome::ActiveRoom { room_id } | EnterOutcome::MatchFound { room_id } => {
                Some(room_id)
            }
            EnterOutcome::Queued => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaveView {
    pub status: &'static str,
}

impl LeaveView {
    pub fn left() -> Self {
        Self { status: "left" }
    }
}

/// Caller-relative room summary for the polling endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MyRoomDetails {
    pub room_id: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub remaining_seconds: i64,
    pub partner_user_id: String,
    pub you_are: Category,
    pub engage_you: bool,
    pub engage_partner: bool,
}

/// `{"state": "none"}` or the state plus [`MyRoomDetails`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MyRoomView {
    pub state: &'static str,
    #[serde(flatten)]
    pub room: Option<MyRoomDetails>,
}

impl MyRoomView {
    pub fn none() -> Self {
        Self {
            state: "none",
            room: None,
        }
    }

    /// Returns [`MyRoomView::none`] when `user_id` is not in the room.
    pub fn for_participant(room: &Room, user_id: &str, now: DateTime<Utc>) -> Self {
        let Some(slot) = room.slot_of(user_id) else {
            return Self::none();
        };
        Self {
            state: room.state.as_str(),
            room: Some(MyRoomDetails {
                room_id: room.room_id.clone(),
                starts_at: room.starts_at,
                ends_at: room.ends_at,
                remaining_seconds: room.remaining_seconds(now),
                partner_user_id: room.user_in(slot.opposite()).to_string(),
                you_are: slot,
                engage_you: room.engaged_by(slot),
                engage_partner: room.engaged_by(slot.opposite()),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngageStatus {
    Pending,
    WaitingForPartner,
    MatchUnlocked,
}

impl EngageStatus {
    pub fn derive(state: RoomState, engaged_by_caller: bool) -> Self {
        if state == RoomState::Engaged {
            EngageStatus::MatchUnlocked
        } else if engaged_by_caller {
            EngageStatus::WaitingForPartner
        } else {
            EngageStatus::Pending
        }
    }
}

/// Detail for `GET /chat-night/room/{room_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomView {
    pub room_id: String,
    pub state: RoomState,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub seconds_remaining: i64,
    pub partner_first_name: String,
    pub partner_photo: Option<String>,
    pub engage_status: EngageStatus,
    pub match_unlocked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngageView {
    pub status: &'static str,
    pub room_state: RoomState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadPartner {
    pub user_id: String,
    pub first_name: String,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastMessage {
    pub text: Option<String>,
    pub at: DateTime<Utc>,
}

/// One row of `GET /chat/threads`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadSummary {
    pub thread_id: String,
    pub match_id: String,
    pub partner: ThreadPartner,
    pub last_message: Option<LastMessage>,
    /// Last message time, or thread creation time.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn room() -> Room {
        let start = Utc.with_ymd_and_hms(2026, 2, 13, 15, 0, 0).unwrap();
        Room {
            room_id: "r1".into(),
            man_user_id: "m".into(),
            woman_user_id: "w".into(),
            starts_at: start,
            ends_at: start + Duration::minutes(5),
            state: RoomState::Active,
            engage_man: true,
            engage_woman: false,
            engaged_at: None,
        }
    }

    #[test]
    fn enter_outcome_wire_shape() {
        let found = EnterOutcome::MatchFound {
            room_id: "r1".into(),
        };
        assert_eq!(
            serde_json::to_value(&found).unwrap(),
            json!({"status": "match_found", "room_id": "r1"})
        );
        assert_eq!(
            serde_json::to_value(EnterOutcome::Queued).unwrap(),
            json!({"status": "queued"})
        );
        assert_eq!(found.room_id(), Some("r1"));
    }

    #[test]
    fn my_room_none_is_bare() {
        assert_eq!(
            serde_json::to_value(MyRoomView::none()).unwrap(),
            json!({"state": "none"})
        );
    }

    #[test]
    fn my_room_is_caller_relative() {
        let room = room();
        let now = room.starts_at + Duration::seconds(60);
        let view = MyRoomView::for_participant(&room, "w", now);
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["state"], "active");
        assert_eq!(value["partner_user_id"], "m");
        assert_eq!(value["you_are"], "woman");
        assert_eq!(value["engage_you"], false);
        assert_eq!(value["engage_partner"], true);
        assert_eq!(value["remaining_seconds"], 240);

        assert_eq!(MyRoomView::for_participant(&room, "x", now), MyRoomView::none());
    }

    #[test]
    fn engage_status_derivation() {
        assert_eq!(
            EngageStatus::derive(RoomState::Active, false),
            EngageStatus::Pending
        );
        assert_eq!(
            EngageStatus::derive(RoomState::Active, true),
            EngageStatus::WaitingForPartner
        );
        assert_eq!(
            EngageStatus::derive(RoomState::Ended, true),
            EngageStatus::WaitingForPartner
        );
        assert_eq!(
            EngageStatus::derive(RoomState::Engaged, false),
            EngageStatus::MatchUnlocked
        );
        assert_eq!(
            serde_json::to_value(EngageStatus::WaitingForPartner).unwrap(),
            json!("waiting_for_partner")
        );
    }
}
