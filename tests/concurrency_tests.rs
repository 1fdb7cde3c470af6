//! Concurrency and thread safety tests for the Chat Night engine

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use chatnight::{Category, ChatNightConfig, EVENT_UNLOCKED, EnterOutcome, RoomState};

mod common;

fn spawn_all<T, F>(ids: Vec<String>, f: F) -> Vec<(String, T)>
where
    T: Send + 'static,
    F: Fn(&str) -> T + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let barrier = Arc::new(Barrier::new(ids.len()));
    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let f = Arc::clone(&f);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let result = f(&id);
                (id, result)
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn concurrent_enter_never_double_books() {
    let s = common::session(ChatNightConfig::default());
    let mut ids = Vec::new();
    for i in 0..10 {
        s.add_man(&format!("m{i}"));
        s.add_woman(&format!("w{i}"));
        ids.push(format!("m{i}"));
        ids.push(format!("w{i}"));
    }

    let engine = Arc::clone(&s.engine);
    let results = spawn_all(ids.clone(), move |id| engine.enter(id).unwrap());

    let matched = results
        .iter()
        .filter(|(_, outcome)| matches!(outcome, EnterOutcome::MatchFound { .. }))
        .count();
    assert_eq!(matched, 10);

    let rooms = s.store.rooms().unwrap();
    assert_eq!(rooms.len(), 10);
    let mut seen = HashSet::new();
    for room in &rooms {
        assert_eq!(room.state, RoomState::Active);
        assert!(seen.insert(room.man_user_id.clone()));
        assert!(seen.insert(room.woman_user_id.clone()));
    }
    assert_eq!(seen.len(), 20);
    assert!(s.store.queue(Category::Man).unwrap().is_empty());
    assert!(s.store.queue(Category::Woman).unwrap().is_empty());

    // A second wave only reports the existing rooms.
    let engine = Arc::clone(&s.engine);
    let again = spawn_all(ids, move |id| engine.enter(id).unwrap());
    assert!(again
        .iter()
        .all(|(_, outcome)| matches!(outcome, EnterOutcome::ActiveRoom { .. })));
    assert_eq!(s.store.rooms().unwrap().len(), 10);

    for i in 0..10 {
        let status = s.engine.status(&format!("m{i}")).unwrap();
        assert_eq!(status.passes_used, 1);
    }
}

#[test]
fn repeated_enter_from_one_user_queues_once() {
    let s = common::session(ChatNightConfig::default());
    s.add_man("m");

    let engine = Arc::clone(&s.engine);
    let results = spawn_all(vec!["m".to_string(); 8], move |id| engine.enter(id).unwrap());
    assert!(results
        .iter()
        .all(|(_, outcome)| *outcome == EnterOutcome::Queued));
    assert_eq!(s.store.queue(Category::Man).unwrap(), vec!["m".to_string()]);
}

#[test]
fn simultaneous_engage_unlocks_exactly_once() {
    for _ in 0..20 {
        let s = common::session(ChatNightConfig::default());
        s.add_man("m");
        s.add_woman("w");
        let room_id = s.pair("m", "w");

        let engine = Arc::clone(&s.engine);
        let results = spawn_all(vec!["m".to_string(), "w".to_string()], move |id| {
            engine.engage(&room_id, id)
        });
        assert!(results.iter().all(|(_, r)| r.is_ok()));

        assert_eq!(s.store.matches_for_user("m").unwrap().len(), 1);
        assert_eq!(s.events.named(EVENT_UNLOCKED).len(), 1);
        assert_eq!(s.engine.threads("m").unwrap().len(), 1);
    }
}
