//! # Chat Night Scorer (`scoring`)
//!
//! Pure compatibility scoring between two profiles, used by the ranked
//! matching mode of the matchmaker.
//!
//! ## Score
//!
//! Six independent signals, each clipped before summing, final score clamped
//! to `[0, 100]`:
//!
//! | Signal | Contribution |
//! |---|---|
//! | shared interests | Jaccard × 40 |
//! | shared values | Jaccard × 20 |
//! | any shared language | 10 |
//! | matching habits (drinking, smoking, exercise, kids) | 5 each, max 20 |
//! | both sides have a prompt | 10 |
//! | candidate recency | 10 / 8 / 6 / 4 / 0 for ≤2 / ≤5 / ≤10 / ≤20 / older minutes |
//!
//! Fractional contributions round half to even.
//!
//! ## Ranking
//!
//! [`rank`] sorts descending by `(score, shared interest count, last active,
//! -hash)` where the hash is SHA-256 over `user:candidate:day_key`. Equal
//! candidates therefore resolve the same way all day, independent of their
//! queue position.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use scoring::{score, CandidateProfile, ReasonTag};
//!
//! let now = Utc.with_ymd_and_hms(2026, 2, 13, 15, 0, 0).unwrap();
//! let user = CandidateProfile {
//!     id: "a".into(),
//!     languages: vec!["English".into()],
//!     ..Default::default()
//! };
//! let candidate = CandidateProfile {
//!     id: "b".into(),
//!     languages: vec!["English".into(), "Hindi".into()],
//!     last_active_at: Some(now),
//!     ..Default::default()
//! };
//! let result = score(&user, &candidate, now);
//! assert_eq!(result.score, 20);
//! assert_eq!(result.reasons, vec![ReasonTag::LanguageMatch, ReasonTag::RecentActive]);
//! ```

pub mod rank;
pub mod score;
pub mod signals;

pub use crate::rank::{pick_best, rank, tie_break_hash, RankedCandidate};
pub use crate::score::{score, CandidateProfile, CandidateScore, ReasonTag, MAX_REASONS};
pub use crate::signals::{jaccard_similarity, normalize_habit, recency_bucket, HABIT_KEYS};
