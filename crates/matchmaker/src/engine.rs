use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use schedule::{Clock, PhoneWhitelist, SystemClock, WindowPolicy};
use serde_json::{json, Value};
use store::{
    Category, ChatNightStore, ConfigLookup, PassEntry, ProfileDirectory, Room, RoomState,
    ThreadStore, UserProfile,
};
use tracing::{info, warn, Level};

use crate::bridge::MatchBridge;
use crate::config::{ChatNightConfig, ConfigError};
use crate::error::MatchmakerError;
use crate::events::{
    EventLog, EventSink, TracingEventSink, EVENT_ENGAGE, EVENT_ENTER, EVENT_MATCH, EVENT_UNLOCKED,
};
use crate::ledger::{PassHolder, PassLedger, PassPolicy};
use crate::matching::{Matchmaker, PartnerChoice};
use crate::metrics::metrics_recorder;
use crate::queues::MatchQueues;
use crate::rooms::RoomManager;
use crate::strength::{effective_min_completion, GateDecision};
use crate::views::{
    EngageStatus, EngageView, EnterOutcome, LeaveView, MyRoomView, QueueStatus, RoomView,
    StatusView, ThreadSummary, WindowState,
};


const UNKNOWN_NAME: &str = "Unknown";

/// Assembles a [`ChatNight`] engine.
///
/// Every collaborator defaults to the store itself (profiles, threads,
/// dynamic config), the system clock and the `tracing` event sink.
pub struct ChatNightBuilder {
    store: Arc<ChatNightStore>,
    config: ChatNightConfig,
    clock: Option<Arc<dyn Clock>>,
    directory: Option<Arc<dyn ProfileDirectory>>,
    threads: Option<Arc<dyn ThreadStore>>,
    settings: Option<Arc<dyn ConfigLookup>>,
    events: Option<Arc<dyn EventSink>>,
}

impl ChatNightBuilder {
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_directory(mut self, directory: Arc<dyn ProfileDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn with_thread_store(mut self, threads: Arc<dyn ThreadStore>) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_settings(mut self, settings: Arc<dyn ConfigLookup>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<ChatNight, ConfigError> {
        self.config.validate()?;
        let store = self.store;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let directory = self
            .directory
            .unwrap_or_else(|| store.clone() as Arc<dyn ProfileDirectory>);
        let threads = self
            .threads
            .unwrap_or_else(|| store.clone() as Arc<dyn ThreadStore>);
        let settings = self
            .settings
            .unwrap_or_else(|| store.clone() as Arc<dyn ConfigLookup>);
        let events = self.events.unwrap_or_else(|| Arc::new(TracingEventSink));

        let window = WindowPolicy::new(self.config.window.clone());
        let whitelist = PhoneWhitelist::parse(&self.config.window.test_users);
        let ledger = PassLedger::new(
            store.clone(),
            PassPolicy::new(self.config.passes.clone(), whitelist),
        );
        let queues = MatchQueues::new(store.clone());
        let rooms = RoomManager::new(store.clone());
        let matchmaker = Matchmaker::new(
            queues.clone(),
            rooms.clone(),
            directory.clone(),
            self.config.matching.clone(),
        );
        let bridge = MatchBridge::new(store.clone(), threads, directory.clone());

        Ok(ChatNight {
            clock,
            store,
            directory,
            settings,
            window,
            ledger,
            queues,
            rooms,
            matchmaker,
            bridge,
            events: EventLog::new(events),
            config: self.config,
            enter_lock: Mutex::new(()),
        })
    }
}

/// The Chat Night service: one method per client operation.
///
/// `enter` runs its quota check, partner claim, room creation and pass
/// debits under a single in-process lock, so one instance never books a
/// user into two rooms. Every other operation relies on the store's atomic
/// per-record updates.
pub struct ChatNight {
    clock: Arc<dyn Clock>,
    store: Arc<ChatNightStore>,
    directory: Arc<dyn ProfileDirectory>,
    settings: Arc<dyn ConfigLookup>,
    window: WindowPolicy,
    ledger: PassLedger,
    queues: MatchQueues,
    rooms: RoomManager,
    matchmaker: Matchmaker,
    bridge: MatchBridge,
    events: EventLog,
    config: ChatNightConfig,
    enter_lock: Mutex<()>,
}

impl ChatNight {
    pub fn builder(store: Arc<ChatNightStore>, config: ChatNightConfig) -> ChatNightBuilder {
        ChatNightBuilder {
            store,
            config,
            clock: None,
            directory: None,
            threads: None,
            settings: None,
            events: None,
        }
    }

    /// Engine with default collaborators.
    pub fn new(store: Arc<ChatNightStore>, config: ChatNightConfig) -> Result<Self, ConfigError> {
        Self::builder(store, config).build()
    }

    pub fn store(&self) -> &Arc<ChatNightStore> {
        &self.store
    }

    pub fn config(&self) -> &ChatNightConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn profile(&self, user_id: &str) -> Result<UserProfile, MatchmakerError> {
        self.directory
            .find_profile(user_id)?
            .ok_or_else(|| MatchmakerError::UnknownUser(user_id.to_string()))
    }

    fn onboarded_profile(&self, user_id: &str) -> Result<UserProfile, MatchmakerError> {
        let profile = self.profile(user_id)?;
        if !profile.is_onboarded() {
            return Err(MatchmakerError::OnboardingIncomplete);
        }
        Ok(profile)
    }

    fn gate(&self, profile: &UserProfile) -> GateDecision {
        let min_completion = effective_min_completion(&self.config.gate, self.settings.as_ref());
        GateDecision::evaluate(
            profile,
            min_completion,
            self.config.gate.bypass_photo_requirement,
        )
    }

    /// Window, gate, quota and queue/room state for the caller.
    pub fn status(&self, user_id: &str) -> Result<StatusView, MatchmakerError> {
        let profile = self.onboarded_profile(user_id)?;
        let now = self.clock.now();
        let window = self.window.status(profile.phone_number.as_deref(), now);

        let gate = self.gate(&profile);
        let (status, detail) = if !gate.passed() {
            let detail = MatchmakerError::ProfileGated {
                required: gate.min_completion,
            }
            .to_string();
            (WindowState::Gated, Some(detail))
        } else if window.is_open {
            (WindowState::Open, None)
        } else {
            (WindowState::Closed, None)
        };

        let pass = self
            .ledger
            .get_or_create(holder(&profile), &window.day_key, now)?;
        let active_room_id = self
            .rooms
            .find_active_room_for(user_id, now)?
            .map(|room| room.room_id);
        let queue_status = if self.queues.contains(user_id)? {
            QueueStatus::Queued
        } else {
            QueueStatus::None
        };

        let remaining = i64::from(pass.passes_total) - i64::from(pass.passes_used);
        Ok(StatusView {
            is_open: window.is_open,
            status,
            min_completion: gate.min_completion,
            user_completion: gate.user_completion,
            detail,
            date_ist: window.day_key,
            seconds_until_open: window.seconds_until_open,
            seconds_until_close: window.seconds_until_close,
            passes_total: pass.passes_total,
            passes_used: pass.passes_used,
            passes_remaining: remaining,
            passes_total_today: pass.passes_total,
            passes_used_today: pass.passes_used,
            passes_remaining_today: remaining,
            active_room_id,
            queue_status,
        })
    }

    /// Join the pool: returns the existing room, the queued marker, or a
    /// freshly created room. Repeating the call never creates a second room
    /// or queue entry.
    pub fn enter(&self, user_id: &str) -> Result<EnterOutcome, MatchmakerError> {
        let start = Instant::now();
        let span = tracing::span!(Level::INFO, "chat_night.enter", user_id = %user_id);
        let _guard = span.enter();

        let result = self.enter_inner(user_id);
        let elapsed = start.elapsed();
        let outcome = match &result {
            Ok(outcome) => {
                info!(
                    outcome = outcome.as_str(),
                    room_id = ?outcome.room_id(),
                    elapsed_micros = elapsed.as_micros(),
                    "enter_success"
                );
                outcome.as_str()
            }
            Err(err) => {
                warn!(
                    error = %err,
                    code = err.error_code(),
                    elapsed_micros = elapsed.as_micros(),
                    "enter_rejected"
                );
                err.error_code()
            }
        };
        if let Some(metrics) = metrics_recorder() {
            metrics.record_enter(outcome, elapsed);
        }
        result
    }

    fn enter_inner(&self, user_id: &str) -> Result<EnterOutcome, MatchmakerError> {
        let profile = self.onboarded_profile(user_id)?;
        let now = self.clock.now();
        let window = self.window.status(profile.phone_number.as_deref(), now);

        let gate = self.gate(&profile);
        if !gate.passed() {
            return Err(MatchmakerError::ProfileGated {
                required: gate.min_completion,
            });
        }
        if !window.is_open {
            return Err(MatchmakerError::WindowClosed);
        }

        self.events.emit(EVENT_ENTER, Some(user_id), Value::Null, now);

        let _booking = self
            .enter_lock
            .lock()
            .map_err(|_| MatchmakerError::LockPoisoned("enter"))?;

        if let Some(room) = self.rooms.find_active_room_for(user_id, now)? {
            return Ok(EnterOutcome::ActiveRoom {
                room_id: room.room_id,
            });
        }
        if self.queues.contains(user_id)? {
            return Ok(EnterOutcome::Queued);
        }

        let pass = self
            .ledger
            .get_or_create(holder(&profile), &window.day_key, now)?;
        if pass.is_exhausted() {
            return Err(MatchmakerError::QuotaExhausted);
        }

        match self.matchmaker.select_partner(&profile, now)? {
            Some(choice) => {
                let room = self.open_room(&profile, &choice, &window.day_key, now)?;
                Ok(EnterOutcome::MatchFound {
                    room_id: room.room_id,
                })
            }
            None => {
                self.queues.enqueue(user_id, profile.category())?;
                Ok(EnterOutcome::Queued)
            }
        }
    }

    /// Debit both passes, then create the room for a claimed partner.
    fn open_room(
        &self,
        requester: &UserProfile,
        choice: &PartnerChoice,
        day_key: &str,
        now: DateTime<Utc>,
    ) -> Result<Room, MatchmakerError> {
        let partner_id = choice.partner_id.as_str();
        let (man, woman) = match requester.category() {
            Category::Man => (requester.id.as_str(), partner_id),
            Category::Woman => (partner_id, requester.id.as_str()),
        };
        let partner_phone = match self.directory.find_profile(partner_id) {
            Ok(profile) => profile.and_then(|p| p.phone_number),
            Err(err) => {
                warn!(partner_id, error = %err, "partner_profile_load_failed");
                None
            }
        };
        let partner = PassHolder {
            user_id: partner_id,
            category: requester.category().opposite(),
            phone: partner_phone.as_deref(),
        };

        // Both passes are debited before the room exists. Any failure
        // refunds what was taken and returns the partner to the pool.
        let mut debited = Vec::with_capacity(2);
        let opened = self
            .ledger
            .consume(holder(requester), day_key, now)
            .map_err(MatchmakerError::from)
            .and_then(|_| {
                debited.push(holder(requester));
                self.ledger.consume(partner, day_key, now)?;
                debited.push(partner);
                Ok(self.rooms.create(man, woman, now)?)
            });
        let room = match opened {
            Ok(room) => room,
            Err(err) => {
                self.undo_open(&debited, partner, day_key, now);
                return Err(err);
            }
        };

        let reason_tags: Vec<&str> = choice.reasons.iter().map(|r| r.as_str()).collect();
        self.events.emit(
            EVENT_MATCH,
            None,
            json!({
                "room_id": room.room_id,
                "users": [room.man_user_id, room.woman_user_id],
                "match_algo": choice.algorithm.as_str(),
                "score": choice.score,
                "reason_tags": reason_tags,
            }),
            now,
        );
        info!(
            room_id = %room.room_id,
            algorithm = choice.algorithm.as_str(),
            score = choice.score,
            "room_created"
        );
        if let Some(metrics) = metrics_recorder() {
            metrics.record_match(choice.algorithm, choice.score);
        }
        Ok(room)
    }

    fn undo_open(
        &self,
        debited: &[PassHolder<'_>],
        partner: PassHolder<'_>,
        day_key: &str,
        now: DateTime<Utc>,
    ) {
        for holder in debited {
            if let Err(err) = self.ledger.refund(*holder, day_key, now) {
                warn!(user_id = holder.user_id, error = %err, "pass_refund_failed");
            }
        }
        if let Err(err) = self.queues.restore(partner.user_id, partner.category) {
            warn!(partner_id = partner.user_id, error = %err, "partner_requeue_failed");
        }
        warn!(partner_id = partner.user_id, "room_open_aborted");
    }

    /// Remove the caller from both pools. Always succeeds for a known store.
    pub fn leave(&self, user_id: &str) -> Result<LeaveView, MatchmakerError> {
        let removed = self.queues.leave(user_id)?;
        info!(user_id, removed, "queue_left");
        Ok(LeaveView::left())
    }

    /// The caller's active room, else their latest engaged room that is
    /// still within its time slot.
    pub fn my_room(&self, user_id: &str) -> Result<MyRoomView, MatchmakerError> {
        let now = self.clock.now();
        let room = match self.rooms.find_active_room_for(user_id, now)? {
            Some(room) => Some(room),
            None => self.rooms.latest_engaged_room_for(user_id, now)?,
        };
        Ok(room
            .map(|room| MyRoomView::for_participant(&room, user_id, now))
            .unwrap_or_else(MyRoomView::none))
    }

    pub fn room(&self, room_id: &str, user_id: &str) -> Result<RoomView, MatchmakerError> {
        let now = self.clock.now();
        let room = self
            .rooms
            .fetch(room_id, now)?
            .ok_or(MatchmakerError::RoomNotFound)?;
        let slot = room
            .slot_of(user_id)
            .ok_or(MatchmakerError::NotParticipant)?;

        let partner_id = room.user_in(slot.opposite());
        let partner = match self.directory.find_profile(partner_id) {
            Ok(profile) => profile,
            Err(err) => {
                warn!(partner_id, error = %err, "partner_profile_load_failed");
                None
            }
        };
        let (partner_first_name, partner_photo) = match partner {
            Some(profile) => (
                profile
                    .first_name
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
                profile.photos.into_iter().next(),
            ),
            None => (UNKNOWN_NAME.to_string(), None),
        };

        let unlocked = room.state == RoomState::Engaged;
        Ok(RoomView {
            engage_status: EngageStatus::derive(room.state, room.engaged_by(slot)),
            seconds_remaining: room.remaining_seconds(now),
            room_id: room.room_id,
            state: room.state,
            starts_at: room.starts_at,
            ends_at: room.ends_at,
            partner_first_name,
            partner_photo,
            match_unlocked: unlocked,
        })
    }

    /// Record the caller's consent. The call that completes the pair
    /// records the match and opens the chat thread.
    pub fn engage(&self, room_id: &str, user_id: &str) -> Result<EngageView, MatchmakerError> {
        let now = self.clock.now();
        let outcome = self.rooms.engage(room_id, user_id, now)?;
        self.events
            .emit(EVENT_ENGAGE, Some(user_id), json!({ "room_id": room_id }), now);

        if outcome.unlocked {
            let room = &outcome.room;
            self.events.emit(
                EVENT_UNLOCKED,
                None,
                json!({
                    "room_id": room.room_id,
                    "users": [room.man_user_id, room.woman_user_id],
                }),
                now,
            );
            let (unlocked, _) = self.bridge.commit_unlock(room, now)?;
            info!(room_id = %room.room_id, match_id = %unlocked.match_id, "room_engaged");
        }
        if let Some(metrics) = metrics_recorder() {
            metrics.record_engage(outcome.unlocked);
        }

        Ok(EngageView {
            status: "success",
            room_state: outcome.room.state,
        })
    }

    /// Chat threads for the caller's unlocked matches, provisioning any that
    /// are missing.
    pub fn threads(&self, user_id: &str) -> Result<Vec<ThreadSummary>, MatchmakerError> {
        Ok(self.bridge.threads_for(user_id, self.clock.now())?)
    }

    /// Add `extra` passes to the user's entry for today.
    pub fn grant_passes(&self, user_id: &str, extra: u32) -> Result<PassEntry, MatchmakerError> {
        let profile = self.profile(user_id)?;
        let now = self.clock.now();
        let day_key = schedule::day_key(now);
        let entry = self.ledger.grant(holder(&profile), &day_key, extra, now)?;
        info!(
            user_id,
            day_key = %day_key,
            extra,
            passes_total = entry.passes_total,
            "passes_granted"
        );
        Ok(entry)
    }
}

fn holder(profile: &UserProfile) -> PassHolder<'_> {
    PassHolder {
        user_id: &profile.id,
        category: profile.category(),
        phone: profile.phone_number.as_deref(),
    }
}
