//! Match and thread provisioning for engaged rooms.
//!
//! A room that reaches `engaged` gets exactly one [`UnlockedMatch`], keyed by
//! the room. The chat thread for that match is provisioned best-effort; any
//! thread that is missing is created the next time the participant lists
//! their threads.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use store::{
    ChatNightStore, ChatThread, ProfileDirectory, Room, RoomState, StoreError, ThreadStore,
    UnlockedMatch,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::views::{LastMessage, ThreadPartner, ThreadSummary};

/// Value of [`UnlockedMatch::source`] for matches created here.
pub const MATCH_SOURCE: &str = "chat_night";

const UNKNOWN_NAME: &str = "Unknown";

#[derive(Clone)]
pub struct MatchBridge {
    store: Arc<ChatNightStore>,
    threads: Arc<dyn ThreadStore>,
    directory: Arc<dyn ProfileDirectory>,
}

impl MatchBridge {
    pub fn new(
        store: Arc<ChatNightStore>,
        threads: Arc<dyn ThreadStore>,
        directory: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            store,
            threads,
            directory,
        }
    }

    /// Record the match for an engaged room, then try to open its thread.
    ///
    /// Returns the stored match and whether this call created it. Thread
    /// failures are logged and never returned.
    pub fn commit_unlock(
        &self,
        room: &Room,
        now: DateTime<Utc>,
    ) -> Result<(UnlockedMatch, bool), StoreError> {
        let (unlocked, created) = self.ensure_match(room, now)?;
        if let Err(err) = self.ensure_thread(&unlocked) {
            warn!(
                match_id = %unlocked.match_id,
                room_id = %room.room_id,
                error = %err,
                "thread_provisioning_failed"
            );
        }
        Ok((unlocked, created))
    }

    fn ensure_match(
        &self,
        room: &Room,
        now: DateTime<Utc>,
    ) -> Result<(UnlockedMatch, bool), StoreError> {
        let candidate = UnlockedMatch {
            match_id: Uuid::new_v4().to_string(),
            user_ids: vec![room.man_user_id.clone(), room.woman_user_id.clone()],
            source: MATCH_SOURCE.to_string(),
            room_id: room.room_id.clone(),
            created_at: now,
        };
        if self.store.insert_match_if_absent(&candidate)? {
            info!(match_id = %candidate.match_id, room_id = %room.room_id, "match_unlocked");
            return Ok((candidate, true));
        }
        let existing = self.store.match_for_room(&room.room_id)?.ok_or_else(|| {
            StoreError::backend(format!("match for room {} vanished", room.room_id))
        })?;
        Ok((existing, false))
    }

    /// Find or create the thread for a match. A concurrent creator winning
    /// the race counts as success.
    pub fn ensure_thread(&self, unlocked: &UnlockedMatch) -> Result<ChatThread, StoreError> {
        if let Some(thread) = self.threads.find_thread(&unlocked.match_id)? {
            return Ok(thread);
        }
        let thread = ChatThread {
            thread_id: Uuid::new_v4().to_string(),
            match_id: unlocked.match_id.clone(),
            participants: unlocked.user_ids.clone(),
            last_message_at: None,
            last_message_text: None,
            created_at: unlocked.created_at,
        };
        match self.threads.create_thread(&thread) {
            Ok(()) => {
                debug!(thread_id = %thread.thread_id, match_id = %thread.match_id, "thread_created");
                Ok(thread)
            }
            Err(StoreError::AlreadyExists(_)) => {
                self.threads.find_thread(&unlocked.match_id)?.ok_or_else(|| {
                    StoreError::backend(format!(
                        "thread for match {} reported existing but not found",
                        unlocked.match_id
                    ))
                })
            }
            Err(err) => Err(err),
        }
    }

    /// The user's threads, newest activity first.
    ///
    /// Engaged rooms without a match record get one, and matches without a
    /// thread get one. Matches whose partner profile is gone are skipped.
    pub fn threads_for(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<ThreadSummary>, StoreError> {
        for room in self.store.rooms_for_user(user_id)? {
            if room.state == RoomState::Engaged && self.store.match_for_room(&room.room_id)?.is_none()
            {
                let at = room.engaged_at.unwrap_or(now);
                self.ensure_match(&room, at)?;
            }
        }

        let mut summaries = Vec::new();
        for unlocked in self.store.matches_for_user(user_id)? {
            let Some(partner_id) = unlocked.partner_of(user_id) else {
                continue;
            };
            let Some(partner) = self.directory.find_profile(partner_id)? else {
                debug!(match_id = %unlocked.match_id, partner_id, "thread_partner_missing");
                continue;
            };
            let thread = self.ensure_thread(&unlocked)?;
            let last_message = thread.last_message_at.map(|at| LastMessage {
                text: thread.last_message_text.clone(),
                at,
            });
            summaries.push(ThreadSummary {
                updated_at: thread.last_message_at.unwrap_or(thread.created_at),
                thread_id: thread.thread_id,
                match_id: unlocked.match_id,
                partner: ThreadPartner {
                    user_id: partner.id,
                    first_name: partner
                        .first_name
                        .filter(|name| !name.is_empty())
                        .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
                    photo: partner.photos.into_iter().next(),
                },
                last_message,
            });
        }
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }
}
