#![allow(dead_code)]

use std::sync::Arc;

use chatnight::{
    ChatNight, ChatNightConfig, ChatNightStore, EnterOutcome, ManualClock, MemoryEventSink,
    UserProfile,
};
use chrono::{DateTime, TimeZone, Utc};

pub struct Session {
    pub engine: Arc<ChatNight>,
    pub store: Arc<ChatNightStore>,
    pub clock: Arc<ManualClock>,
    pub events: Arc<MemoryEventSink>,
}

/// 21:00 IST on 2026-02-13, one hour before the window closes.
pub fn open_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 13, 15, 30, 0).unwrap()
}

pub fn session(config: ChatNightConfig) -> Session {
    session_on(Arc::new(ChatNightStore::in_memory()), config)
}

pub fn session_on(store: Arc<ChatNightStore>, config: ChatNightConfig) -> Session {
    let clock = Arc::new(ManualClock::new(open_instant()));
    let events = Arc::new(MemoryEventSink::new());
    let engine = ChatNight::builder(store.clone(), config)
        .with_clock(clock.clone())
        .with_event_sink(events.clone())
        .build()
        .unwrap();
    Session {
        engine: Arc::new(engine),
        store,
        clock,
        events,
    }
}

pub fn profile(id: &str, gender: &str) -> UserProfile {
    UserProfile {
        id: id.into(),
        first_name: Some(format!("{id}-name")),
        gender: Some(gender.into()),
        photos: vec![format!("https://cdn.example/{id}.jpg")],
        ..Default::default()
    }
}

impl Session {
    pub fn add_man(&self, id: &str) {
        self.store.put_profile(&profile(id, "Man")).unwrap();
    }

    pub fn add_woman(&self, id: &str) {
        self.store.put_profile(&profile(id, "Woman")).unwrap();
    }

    /// Queue `man`, then let `woman` complete the pair. Returns the room id.
    pub fn pair(&self, man: &str, woman: &str) -> String {
        assert_eq!(self.engine.enter(man).unwrap(), EnterOutcome::Queued);
        match self.engine.enter(woman).unwrap() {
            EnterOutcome::MatchFound { room_id } => room_id,
            other => panic!("expected a match for {woman}, got {other:?}"),
        }
    }
}
