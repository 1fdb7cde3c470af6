use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::score::{score, CandidateProfile, ReasonTag};

/// One scored entry of a ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCandidate {
    pub candidate_id: String,
    pub score: u32,
    pub reasons: Vec<ReasonTag>,
    pub shared_interests: usize,
    pub last_active_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    tie_break: u128,
}

impl RankedCandidate {
    fn sort_key(&self) -> (u32, usize, Option<DateTime<Utc>>, Reverse<u128>) {
        (
            self.score,
            self.shared_interests,
            self.last_active_at,
            Reverse(self.tie_break),
        )
    }
}

/// Stable 128-bit hash of `user_id:candidate_id:day_key`.
pub fn tie_break_hash(user_id: &str, candidate_id: &str, day_key: &str) -> u128 {
    let digest = Sha256::digest(format!("{user_id}:{candidate_id}:{day_key}").as_bytes());
    let mut prefix = [0u8; 16];
    prefix.copy_from_slice(&digest[..16]);
    u128::from_be_bytes(prefix)
}

/// Score up to `limit` candidates and order them best first.
///
/// Ties on score fall back to shared interest count, then most recent
/// activity (absent counts as oldest), then the day-scoped hash.
pub fn rank(
    user: &CandidateProfile,
    candidates: &[CandidateProfile],
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<RankedCandidate> {
    let day = schedule::day_key(now);

    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .take(limit)
        .map(|candidate| {
            let result = score(user, candidate, now);
            RankedCandidate {
                candidate_id: candidate.id.clone(),
                score: result.score,
                reasons: result.reasons,
                shared_interests: user.shared_interest_count(candidate),
                last_active_at: candidate.last_active_at,
                tie_break: tie_break_hash(&user.id, &candidate.id, &day),
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
    ranked
}

/// Head of [`rank`], if any candidate was supplied.
pub fn pick_best(
    user: &CandidateProfile,
    candidates: &[CandidateProfile],
    now: DateTime<Utc>,
    limit: usize,
) -> Option<RankedCandidate> {
    rank(user, candidates, now, limit).into_iter().next()
}
