use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

/// Habit attributes compared between profiles.
pub const HABIT_KEYS: [&str; 4] = ["drinking", "smoking", "exercise", "kids"];

/// Non-blank values as a set.
pub(crate) fn clean_set(values: &[String]) -> BTreeSet<&str> {
    values
        .iter()
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .collect()
}

/// `|A ∩ B| / |A ∪ B|`, or `0.0` when both sets are empty.
pub fn jaccard_similarity(a: &BTreeSet<&str>, b: &BTreeSet<&str>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Habit values compare trimmed and case-insensitively.
pub fn normalize_habit(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_lowercase()).unwrap_or_default()
}

/// Recency weight in `[0, 1]` for the candidate's last activity.
///
/// Timestamps in the future count as "just now".
pub fn recency_bucket(last_active_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(last) = last_active_at else {
        return 0.0;
    };
    let age_minutes = ((now - last).num_milliseconds() as f64 / 60_000.0).max(0.0);

    if age_minutes <= 2.0 {
        1.0
    } else if age_minutes <= 5.0 {
        0.8
    } else if age_minutes <= 10.0 {
        0.6
    } else if age_minutes <= 20.0 {
        0.4
    } else {
        0.0
    }
}
