//! Records persisted by the Chat Night store.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Matchmaking role. Each room pairs one participant of each category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Man,
    Woman,
}

impl Category {
    /// `"Woman"` maps to [`Category::Woman`]; everything else, including a
    /// missing gender, maps to [`Category::Man`].
    pub fn from_gender(gender: Option<&str>) -> Self {
        match gender {
            Some("Woman") => Category::Woman,
            _ => Category::Man,
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Category::Man => Category::Woman,
            Category::Woman => Category::Man,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Man => "man",
            Category::Woman => "woman",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompt {
    pub question: String,
    pub answer: String,
}

/// Profile data owned by the external profile service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub id: String,
    pub phone_number: Option<String>,
    pub first_name: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub onboarding_completed: bool,
    pub bio: Option<String>,
    pub prompts: Vec<Prompt>,
    pub work: Option<String>,
    pub location: Option<String>,
    pub education_level: Option<String>,
    pub hometown: Option<String>,
    pub height: Option<String>,
    pub star_sign: Option<String>,
    pub religion: Option<String>,
    pub politics: Option<String>,
    pub kids_have: Option<String>,
    pub kids_want: Option<String>,
    pub habits: BTreeMap<String, String>,
    pub interests: Vec<String>,
    pub values: Vec<String>,
    pub languages: Vec<String>,
    pub photos: Vec<String>,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn category(&self) -> Category {
        Category::from_gender(self.gender.as_deref())
    }

    /// Gender and first name are required before using Chat Night.
    pub fn is_onboarded(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.gender) && filled(&self.first_name)
    }
}

/// Daily pass quota for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassEntry {
    pub user_id: String,
    pub day_key: String,
    pub passes_total: u32,
    pub passes_used: u32,
    pub updated_at: DateTime<Utc>,
}

impl PassEntry {
    pub fn remaining(&self) -> u32 {
        self.passes_total.saturating_sub(self.passes_used)
    }

    pub fn is_exhausted(&self) -> bool {
        self.passes_used >= self.passes_total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    Active,
    Ended,
    Engaged,
}

impl RoomState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RoomState::Active => "active",
            RoomState::Ended => "ended",
            RoomState::Engaged => "engaged",
        }
    }
}

/// A live two-party pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub room_id: String,
    pub man_user_id: String,
    pub woman_user_id: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub state: RoomState,
    #[serde(default)]
    pub engage_man: bool,
    #[serde(default)]
    pub engage_woman: bool,
    #[serde(default)]
    pub engaged_at: Option<DateTime<Utc>>,
}

impl Room {
    pub fn involves(&self, user_id: &str) -> bool {
        self.man_user_id == user_id || self.woman_user_id == user_id
    }

    /// Which slot the user occupies, if any.
    pub fn slot_of(&self, user_id: &str) -> Option<Category> {
        if self.man_user_id == user_id {
            Some(Category::Man)
        } else if self.woman_user_id == user_id {
            Some(Category::Woman)
        } else {
            None
        }
    }

    pub fn user_in(&self, slot: Category) -> &str {
        match slot {
            Category::Man => &self.man_user_id,
            Category::Woman => &self.woman_user_id,
        }
    }

    pub fn engaged_by(&self, slot: Category) -> bool {
        match slot {
            Category::Man => self.engage_man,
            Category::Woman => self.engage_woman,
        }
    }

    pub fn set_engaged(&mut self, slot: Category) {
        match slot {
            Category::Man => self.engage_man = true,
            Category::Woman => self.engage_woman = true,
        }
    }

    pub fn both_engaged(&self) -> bool {
        self.engage_man && self.engage_woman
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now > self.ends_at
    }

    /// Whole seconds until `ends_at`, never negative.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.ends_at - now).num_seconds().max(0)
    }

    /// Flip an overdue active room to `Ended`. Returns whether it changed.
    pub fn expire_if_overdue(&mut self, now: DateTime<Utc>) -> bool {
        if self.state == RoomState::Active && self.is_overdue(now) {
            self.state = RoomState::Ended;
            return true;
        }
        false
    }
}

/// Durable record of a mutual engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedMatch {
    pub match_id: String,
    pub user_ids: Vec<String>,
    pub source: String,
    pub room_id: String,
    pub created_at: DateTime<Utc>,
}

impl UnlockedMatch {
    pub fn partner_of(&self, user_id: &str) -> Option<&str> {
        if !self.user_ids.iter().any(|u| u == user_id) {
            return None;
        }
        self.user_ids
            .iter()
            .map(String::as_str)
            .find(|u| *u != user_id)
    }
}

/// Messaging thread bridged from an unlocked match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatThread {
    pub thread_id: String,
    pub match_id: String,
    pub participants: Vec<String>,
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_message_text: Option<String>,
    pub created_at: DateTime<Utc>,
}
