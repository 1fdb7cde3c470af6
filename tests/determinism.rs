use std::collections::BTreeMap;

use chatnight::{
    CandidateProfile, ChatNightConfig, EVENT_MATCH, EnterOutcome, MatchingConfig, RankedCandidate,
    rank,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

mod common;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 13, 15, 30, 0).unwrap()
}

fn candidate(id: &str, interests: &[&str]) -> CandidateProfile {
    CandidateProfile {
        id: id.into(),
        interests: interests.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

fn ids(ranked: &[RankedCandidate]) -> Vec<String> {
    ranked.iter().map(|r| r.candidate_id.clone()).collect()
}

#[test]
fn identical_inputs_rank_identically() {
    let me = CandidateProfile {
        id: "me".into(),
        interests: vec!["hiking".into(), "jazz".into(), "chess".into()],
        values: vec!["honesty".into()],
        languages: vec!["en".into()],
        habits: BTreeMap::from([("drinking".to_string(), "Never".to_string())]),
        prompts: vec!["Sunday\nlong walks".into()],
        last_active_at: Some(now()),
    };
    let candidates: Vec<CandidateProfile> = (0..12)
        .map(|i| {
            let mut c = candidate(&format!("c{i}"), &["hiking", "jazz"][..i % 3]);
            c.last_active_at = Some(now() - Duration::minutes(i as i64 % 4));
            c
        })
        .collect();

    let first = rank(&me, &candidates, now(), 50);
    for _ in 0..5 {
        assert_eq!(rank(&me, &candidates, now(), 50), first);
    }

    let mut reversed = candidates.clone();
    reversed.reverse();
    assert_eq!(ids(&rank(&me, &reversed, now(), 50)), ids(&first));
}

#[test]
fn ties_do_not_follow_queue_order() {
    let me = candidate("me", &[]);
    let pool: Vec<CandidateProfile> = (0..32).map(|i| candidate(&format!("c{i:02}"), &[])).collect();

    let ranked = rank(&me, &pool, now(), 32);
    assert!(ranked.iter().all(|r| r.score == 0));
    let order: Vec<&str> = ranked.iter().map(|r| r.candidate_id.as_str()).collect();
    let queue_order: Vec<String> = pool.iter().map(|c| c.id.clone()).collect();
    assert_ne!(order, queue_order.iter().map(String::as_str).collect::<Vec<_>>());

    // A different day reshuffles the tie order.
    let tomorrow = rank(&me, &pool, now() + Duration::days(1), 32);
    let tomorrow_order: Vec<&str> = tomorrow.iter().map(|r| r.candidate_id.as_str()).collect();
    assert_ne!(order, tomorrow_order);
}

#[test]
fn scored_matching_picks_same_partner_for_same_day() {
    let config = ChatNightConfig {
        matching: MatchingConfig {
            scored_enabled: true,
            ..MatchingConfig::default()
        },
        ..ChatNightConfig::default()
    };

    let pick = || {
        let s = common::session(config.clone());
        for id in ["m1", "m2", "m3", "m4"] {
            s.add_man(id);
            assert_eq!(s.engine.enter(id).unwrap(), EnterOutcome::Queued);
        }
        s.add_woman("w");
        let room_id = match s.engine.enter("w").unwrap() {
            EnterOutcome::MatchFound { room_id } => room_id,
            other => panic!("expected a match, got {other:?}"),
        };
        let events = s.events.named(EVENT_MATCH);
        assert_eq!(events[0].payload["match_algo"], "v5");
        s.store.room(&room_id).unwrap().unwrap().man_user_id
    };

    let partner = pick();
    for _ in 0..3 {
        assert_eq!(pick(), partner);
    }
}
