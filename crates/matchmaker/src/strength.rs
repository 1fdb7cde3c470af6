//! Profile strength and the Chat Night completion gate.
use serde::Serialize;
use store::{ConfigLookup, UserProfile};
use tracing::warn;

use crate::config::{GateConfig, MIN_COMPLETION_CONFIG_KEY};

pub const REQUIRED_PHOTOS: usize = 4;

const BASE_POINTS: u32 = 50;
const BONUS_POINTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StrengthTier {
    Bronze,
    Silver,
    Gold,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileStrength {
    pub completion_percent: u32,
    pub missing_fields: Vec<&'static str>,
    pub tier: StrengthTier,
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Completion score in `[0, 100]`.
///
/// A base of 50 is earned by finished onboarding, or by first name, birth
/// date, gender and at least [`REQUIRED_PHOTOS`] photos. Each of bio,
/// prompt, basics, details and interests adds 10, but only once the base is
/// earned. Missing sections are reported either way.
pub fn compute_profile_strength(profile: &UserProfile, bypass_photos: bool) -> ProfileStrength {
    let mut score = 0;
    let mut missing = Vec::new();

    let photo_count = profile.photos.len();
    let has_basic_info = has_text(profile.first_name.as_deref())
        && profile.birth_date.is_some()
        && has_text(profile.gender.as_deref());
    let base_fields_ok = has_basic_info && (photo_count >= REQUIRED_PHOTOS || bypass_photos);
    let base_complete = profile.onboarding_completed || base_fields_ok;

    if base_complete {
        score += BASE_POINTS;
    } else {
        missing.push("onboarding_completed");
        if photo_count < REQUIRED_PHOTOS {
            missing.push("photos");
        }
    }

    let bio_ok = profile
        .bio
        .as_deref()
        .is_some_and(|bio| bio.trim().chars().count() >= 10);

    let prompt_ok = profile
        .prompts
        .iter()
        .any(|p| has_text(Some(p.question.as_str())) && has_text(Some(p.answer.as_str())));

    let basics_ok = has_text(profile.work.as_deref()) && has_text(profile.location.as_deref());

    let detail_fields = [
        &profile.education_level,
        &profile.hometown,
        &profile.height,
        &profile.star_sign,
        &profile.religion,
        &profile.politics,
        &profile.kids_have,
        &profile.kids_want,
    ];
    let mut details = detail_fields
        .iter()
        .filter(|field| has_text(field.as_deref()))
        .count();
    if profile.habits.values().any(|v| has_text(Some(v.as_str()))) {
        details += 1;
    }
    let details_ok = details >= 3;

    let interests_ok = profile.interests.len() >= 3;

    for (ok, name) in [
        (bio_ok, "bio"),
        (prompt_ok, "prompts"),
        (basics_ok, "basics"),
        (details_ok, "details"),
        (interests_ok, "interests"),
    ] {
        if !ok {
            missing.push(name);
        } else if base_complete {
            score += BONUS_POINTS;
        }
    }

    let completion_percent = score.min(100);
    let tier = if completion_percent >= 80 {
        StrengthTier::Gold
    } else if completion_percent >= 50 {
        StrengthTier::Silver
    } else {
        StrengthTier::Bronze
    };

    ProfileStrength {
        completion_percent,
        missing_fields: missing,
        tier,
    }
}

/// Gate threshold: the dynamic key when it holds only digits, else the
/// static setting. Lookup failures fall back to the static setting.
pub fn effective_min_completion(gate: &GateConfig, settings: &dyn ConfigLookup) -> u32 {
    match settings.lookup(MIN_COMPLETION_CONFIG_KEY) {
        Ok(Some(value)) if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) => {
            value.parse().unwrap_or(gate.min_completion)
        }
        Ok(_) => gate.min_completion,
        Err(err) => {
            warn!(error = %err, key = MIN_COMPLETION_CONFIG_KEY, "dynamic_config_lookup_failed");
            gate.min_completion
        }
    }
}

/// Outcome of the completion gate for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDecision {
    pub min_completion: u32,
    /// Zero when the gate is disabled; strength is not computed then.
    pub user_completion: u32,
}

impl GateDecision {
    pub fn evaluate(profile: &UserProfile, min_completion: u32, bypass_photos: bool) -> Self {
        let user_completion = if min_completion > 0 {
            compute_profile_strength(profile, bypass_photos).completion_percent
        } else {
            0
        };
        Self {
            min_completion,
            user_completion,
        }
    }

    pub fn passed(&self) -> bool {
        self.min_completion == 0 || self.user_completion >= self.min_completion
    }
}
