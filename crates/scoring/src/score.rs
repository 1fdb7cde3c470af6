use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::signals::{clean_set, jaccard_similarity, normalize_habit, recency_bucket, HABIT_KEYS};

/// Upper bound on emitted reason tags.
pub const MAX_REASONS: usize = 6;

/// The profile attributes the scorer reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub habits: BTreeMap<String, String>,
    /// Prompt answers; blank entries do not count.
    #[serde(default)]
    pub prompts: Vec<String>,
    #[serde(default)]
    pub last_active_at: Option<DateTime<Utc>>,
}

impl CandidateProfile {
    pub(crate) fn has_prompt(&self) -> bool {
        self.prompts.iter().any(|p| !p.trim().is_empty())
    }

    pub(crate) fn shared_interest_count(&self, other: &CandidateProfile) -> usize {
        clean_set(&self.interests)
            .intersection(&clean_set(&other.interests))
            .count()
    }
}

/// Why a candidate scored, in fixed signal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonTag {
    InterestsOverlap,
    ValuesOverlap,
    LanguageMatch,
    HabitsMatch,
    PromptOverlap,
    RecentActive,
}

impl ReasonTag {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InterestsOverlap => "interests_overlap",
            Self::ValuesOverlap => "values_overlap",
            Self::LanguageMatch => "language_match",
            Self::HabitsMatch => "habits_match",
            Self::PromptOverlap => "prompt_overlap",
            Self::RecentActive => "recent_active",
        }
    }
}

/// Compatibility score in `[0, 100]` with its reason tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateScore {
    pub score: u32,
    pub reasons: Vec<ReasonTag>,
}

fn weighted(weight: f64, fraction: f64) -> u32 {
    (weight * fraction).round_ties_even().max(0.0) as u32
}

/// Score `candidate` from the point of view of `user`.
pub fn score(user: &CandidateProfile, candidate: &CandidateProfile, now: DateTime<Utc>) -> CandidateScore {
    let interests = weighted(
        40.0,
        jaccard_similarity(&clean_set(&user.interests), &clean_set(&candidate.interests)),
    );
    let values = weighted(
        20.0,
        jaccard_similarity(&clean_set(&user.values), &clean_set(&candidate.values)),
    );

    let user_languages = clean_set(&user.languages);
    let language = if clean_set(&candidate.languages)
        .intersection(&user_languages)
        .next()
        .is_some()
    {
        10
    } else {
        0
    };

    let habit_matches = HABIT_KEYS
        .iter()
        .filter(|key| {
            let mine = normalize_habit(user.habits.get(**key).map(String::as_str));
            let theirs = normalize_habit(candidate.habits.get(**key).map(String::as_str));
            !mine.is_empty() && mine == theirs
        })
        .count() as u32;
    let habits = (habit_matches * 5).min(20);

    let prompts = if user.has_prompt() && candidate.has_prompt() {
        10
    } else {
        0
    };

    let recency = weighted(10.0, recency_bucket(candidate.last_active_at, now));

    let total = (interests + values + language + habits + prompts + recency).min(100);

    let reasons = [
        (interests, ReasonTag::InterestsOverlap),
        (values, ReasonTag::ValuesOverlap),
        (language, ReasonTag::LanguageMatch),
        (habits, ReasonTag::HabitsMatch),
        (prompts, ReasonTag::PromptOverlap),
        (recency, ReasonTag::RecentActive),
    ]
    .into_iter()
    .filter(|(points, _)| *points > 0)
    .map(|(_, tag)| tag)
    .take(MAX_REASONS)
    .collect();

    CandidateScore {
        score: total,
        reasons,
    }
}
