//! Room lifecycle: `active -> engaged` or `active -> ended`.
//!
//! Expiry is lazy. Any read that finds an active room past `ends_at` flips
//! that room to `ended` and touches nothing else.
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use schedule::ROOM_DURATION_MINUTES;
use store::{ChatNightStore, Room, RoomState, StoreError};
use tracing::debug;
use uuid::Uuid;

use crate::error::MatchmakerError;

/// Result of a successful engage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngageOutcome {
    pub room: Room,
    /// True only for the call that completed the pair.
    pub unlocked: bool,
}

#[derive(Clone)]
pub struct RoomManager {
    store: Arc<ChatNightStore>,
}

impl RoomManager {
    pub fn new(store: Arc<ChatNightStore>) -> Self {
        Self { store }
    }

    pub fn create(
        &self,
        man_user_id: &str,
        woman_user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Room, StoreError> {
        let room = Room {
            room_id: Uuid::new_v4().to_string(),
            man_user_id: man_user_id.to_string(),
            woman_user_id: woman_user_id.to_string(),
            starts_at: now,
            ends_at: now + Duration::minutes(ROOM_DURATION_MINUTES),
            state: RoomState::Active,
            engage_man: false,
            engage_woman: false,
            engaged_at: None,
        };
        self.store.insert_room(&room)?;
        Ok(room)
    }

    /// Load a room, ending it first if it is overdue.
    pub fn fetch(&self, room_id: &str, now: DateTime<Utc>) -> Result<Option<Room>, StoreError> {
        self.store.modify_room(room_id, |current| {
            Ok(match current {
                Some(mut room) => {
                    if room.expire_if_overdue(now) {
                        debug!(room_id = %room.room_id, "room_expired_on_read");
                        (Some(room.clone()), Some(room))
                    } else {
                        (None, Some(room))
                    }
                }
                None => (None, None),
            })
        })
    }

    /// The user's active room, if any. Overdue rooms found on the way are
    /// ended and skipped.
    pub fn find_active_room_for(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Room>, StoreError> {
        let mut candidates: Vec<Room> = self
            .store
            .rooms_for_user(user_id)?
            .into_iter()
            .filter(|room| room.state == RoomState::Active)
            .collect();
        candidates.sort_by(|a, b| b.starts_at.cmp(&a.starts_at));

        for room in candidates {
            if let Some(room) = self.fetch(&room.room_id, now)? {
                if room.state == RoomState::Active {
                    return Ok(Some(room));
                }
            }
        }
        Ok(None)
    }

    /// Most recently engaged room that has not reached `ends_at`.
    pub fn latest_engaged_room_for(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Room>, StoreError> {
        Ok(self
            .store
            .rooms_for_user(user_id)?
            .into_iter()
            .filter(|room| room.state == RoomState::Engaged && !room.is_overdue(now))
            .max_by_key(|room| room.engaged_at.unwrap_or(room.starts_at)))
    }

    /// Everyone paired with `user_id` in rooms started within the last
    /// `minutes`.
    pub fn recent_partner_ids(
        &self,
        user_id: &str,
        minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<HashSet<String>, StoreError> {
        if minutes <= 0 {
            return Ok(HashSet::new());
        }
        let since = now - Duration::minutes(minutes);
        let mut partners: HashSet<String> = self
            .store
            .rooms_for_user(user_id)?
            .into_iter()
            .filter(|room| room.starts_at >= since)
            .filter_map(|room| {
                room.slot_of(user_id)
                    .map(|slot| room.user_in(slot.opposite()).to_string())
            })
            .collect();
        partners.remove(user_id);
        Ok(partners)
    }

    /// Record `user_id`'s consent.
    ///
    /// Rejections, in order: missing room, room not active, room overdue
    /// (which also ends it), caller not a participant.
    pub fn engage(
        &self,
        room_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<EngageOutcome, MatchmakerError> {
        self.store.modify_room(room_id, |current| {
            let Some(mut room) = current else {
                return Ok((None, Err(MatchmakerError::RoomNotFound)));
            };
            if room.state != RoomState::Active {
                return Ok((None, Err(MatchmakerError::RoomNotActive)));
            }
            if room.expire_if_overdue(now) {
                return Ok((Some(room), Err(MatchmakerError::RoomExpired)));
            }
            let Some(slot) = room.slot_of(user_id) else {
                return Ok((None, Err(MatchmakerError::NotParticipant)));
            };

            room.set_engaged(slot);
            let unlocked = room.both_engaged();
            if unlocked {
                room.state = RoomState::Engaged;
                room.engaged_at = Some(now);
            }
            Ok((Some(room.clone()), Ok(EngageOutcome { room, unlocked })))
        })?
    }
}
