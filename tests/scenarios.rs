//! End-to-end session scenarios driven through the `ChatNight` façade.

mod common;

use chatnight::{
    Category, ChatNightConfig, EVENT_MATCH, EVENT_UNLOCKED, EngageStatus, EnterOutcome,
    MatchmakerError, QueueStatus, RoomState,
};
use chrono::Duration;
use common::session;

#[test]
fn opposite_categories_share_one_room() {
    let s = session(ChatNightConfig::default());
    s.add_man("x");
    s.add_woman("y");

    let room_id = s.pair("x", "y");

    // The queued side learns about the room on its next poll.
    assert_eq!(
        s.engine.enter("x").unwrap(),
        EnterOutcome::ActiveRoom {
            room_id: room_id.clone()
        }
    );
    assert_eq!(s.engine.status("x").unwrap().active_room_id, Some(room_id.clone()));
    assert_eq!(s.engine.status("y").unwrap().active_room_id, Some(room_id.clone()));

    let room = s.store.room(&room_id).unwrap().unwrap();
    assert_eq!(room.man_user_id, "x");
    assert_eq!(room.woman_user_id, "y");
    assert_eq!(room.state, RoomState::Active);
    assert!(s.store.queue(Category::Man).unwrap().is_empty());
    assert!(s.store.queue(Category::Woman).unwrap().is_empty());

    let matches = s.events.named(EVENT_MATCH);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].payload["match_algo"], "fifo");
}

#[test]
fn leaving_the_queue_prevents_later_pairing() {
    let s = session(ChatNightConfig::default());
    s.add_man("x");
    s.add_woman("z");

    assert_eq!(s.engine.enter("x").unwrap(), EnterOutcome::Queued);
    assert_eq!(s.engine.status("x").unwrap().queue_status, QueueStatus::Queued);

    s.engine.leave("x").unwrap();
    assert_eq!(s.engine.status("x").unwrap().queue_status, QueueStatus::None);

    assert_eq!(s.engine.enter("z").unwrap(), EnterOutcome::Queued);
    assert_eq!(s.store.queue(Category::Woman).unwrap(), vec!["z".to_string()]);
    assert!(s.store.rooms().unwrap().is_empty());
}

#[test]
fn mutual_engagement_unlocks_match_and_thread() {
    let s = session(ChatNightConfig::default());
    s.add_man("x");
    s.add_woman("y");
    let room_id = s.pair("x", "y");

    let first = s.engine.engage(&room_id, "x").unwrap();
    assert_eq!(first.room_state, RoomState::Active);
    assert_eq!(
        s.engine.room(&room_id, "x").unwrap().engage_status,
        EngageStatus::WaitingForPartner
    );

    let second = s.engine.engage(&room_id, "y").unwrap();
    assert_eq!(second.room_state, RoomState::Engaged);

    let unlocked = s.store.match_for_room(&room_id).unwrap().unwrap();
    assert_eq!(unlocked.partner_of("x"), Some("y"));
    assert!(s.store.thread(&unlocked.match_id).unwrap().is_some());

    let threads = s.engine.threads("y").unwrap();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].match_id, unlocked.match_id);
    assert_eq!(threads[0].partner.user_id, "x");
    assert_eq!(s.events.named(EVENT_UNLOCKED).len(), 1);

    // Terminal: a repeat engage changes nothing.
    assert!(matches!(
        s.engine.engage(&room_id, "x"),
        Err(MatchmakerError::RoomNotActive)
    ));
    assert_eq!(s.store.matches_for_user("x").unwrap().len(), 1);
    assert_eq!(s.events.named(EVENT_UNLOCKED).len(), 1);

    let view = s.engine.my_room("x").unwrap();
    assert_eq!(view.state, "engaged");
}

#[test]
fn overdue_room_reads_as_ended() {
    let s = session(ChatNightConfig::default());
    s.add_man("x");
    s.add_woman("y");
    let room_id = s.pair("x", "y");

    s.clock.advance(Duration::minutes(5) + Duration::seconds(1));
    let view = s.engine.room(&room_id, "y").unwrap();
    assert_eq!(view.state, RoomState::Ended);
    assert_eq!(view.seconds_remaining, 0);
    assert_eq!(view.engage_status, EngageStatus::Pending);
    assert!(!view.match_unlocked);

    assert_eq!(s.store.room(&room_id).unwrap().unwrap().state, RoomState::Ended);
    assert_eq!(s.engine.my_room("x").unwrap().state, "none");
    assert!(s.store.matches_for_user("x").unwrap().is_empty());
}

#[test]
fn exhausted_quota_rejects_without_queueing() {
    let s = session(ChatNightConfig::default());
    s.add_man("x");
    s.add_woman("y");
    s.pair("x", "y");
    s.clock.advance(Duration::minutes(6));

    let status = s.engine.status("x").unwrap();
    assert_eq!(status.passes_used, status.passes_total);

    assert!(matches!(
        s.engine.enter("x"),
        Err(MatchmakerError::QuotaExhausted)
    ));
    assert!(s.store.queue(Category::Man).unwrap().is_empty());
    assert_eq!(s.store.rooms().unwrap().len(), 1);
}

#[test]
fn matches_per_day_never_exceed_grant() {
    let s = session(ChatNightConfig::default());
    s.add_woman("w");
    for man in ["m1", "m2", "m3"] {
        s.add_man(man);
    }

    s.pair("m1", "w");
    s.clock.advance(Duration::minutes(6));
    s.pair("m2", "w");
    s.clock.advance(Duration::minutes(6));

    assert_eq!(s.engine.enter("m3").unwrap(), EnterOutcome::Queued);
    assert!(matches!(
        s.engine.enter("w"),
        Err(MatchmakerError::QuotaExhausted)
    ));

    let rooms_with_w = s.store.rooms_for_user("w").unwrap();
    assert_eq!(rooms_with_w.len(), 2);
    let status = s.engine.status("w").unwrap();
    assert_eq!(status.passes_total, 2);
    assert_eq!(status.passes_used, 2);
    assert_eq!(status.passes_remaining, 0);
}

#[test]
fn remaining_seconds_only_count_down() {
    let s = session(ChatNightConfig::default());
    s.add_man("x");
    s.add_woman("y");
    let room_id = s.pair("x", "y");

    let mut last = i64::MAX;
    for _ in 0..8 {
        let view = s.engine.room(&room_id, "x").unwrap();
        assert!(view.seconds_remaining >= 0);
        assert!(view.seconds_remaining <= last);
        last = view.seconds_remaining;
        s.clock.advance(Duration::seconds(50));
    }
    assert_eq!(last, 0);
}

#[test]
fn closed_window_rejects_enter() {
    let s = session(ChatNightConfig::default());
    s.add_man("x");
    s.clock.advance(Duration::hours(2));

    let status = s.engine.status("x").unwrap();
    assert!(!status.is_open);
    assert!(matches!(
        s.engine.enter("x"),
        Err(MatchmakerError::WindowClosed)
    ));
    assert!(s.store.queue(Category::Man).unwrap().is_empty());
}
