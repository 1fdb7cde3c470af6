//! Configuration types for the Chat Night engine.
//!
//! [`ChatNightConfig`] groups every runtime override the engine honours. All
//! fields carry serde defaults, so an empty document deserializes to the
//! production behaviour: a closed-by-default 20:00 to 22:00 IST window, one
//! pass for men and two for women, FIFO matching and no completion gate.
//!
//! # Quick Start
//!
//! ```rust
//! use matchmaker::ChatNightConfig;
//!
//! let config = ChatNightConfig::default();
//! config.validate().expect("defaults are valid");
//! assert_eq!(config.passes.man_passes, 1);
//! assert_eq!(config.passes.woman_passes, 2);
//! ```
//!
//! # Serialized Form
//!
//! ```toml
//! [chat_night.window]
//! force_open = false
//! test_mode = false
//! test_users = "+91 98765 43210, 9123456789"
//!
//! [chat_night.passes]
//! man_passes = 1
//! woman_passes = 2
//!
//! [chat_night.matching]
//! scored_enabled = true
//! max_candidates = 50
//! min_score = 20
//! pair_cooldown_minutes = 30
//!
//! [chat_night.gate]
//! min_completion = 60
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use schedule::WindowConfig;

/// Key consulted in the dynamic config store before [`GateConfig::min_completion`].
pub const MIN_COMPLETION_CONFIG_KEY: &str = "PROFILE_MIN_COMPLETION_FOR_CHAT_NIGHT";

/// Runtime configuration for the Chat Night engine.
///
/// # Examples
///
/// ```rust
/// use matchmaker::{ChatNightConfig, MatchingConfig};
///
/// let config = ChatNightConfig {
///     matching: MatchingConfig {
///         scored_enabled: true,
///         min_score: 25,
///         ..MatchingConfig::default()
///     },
///     ..ChatNightConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatNightConfig {
    /// Window overrides (force open, test mode, per-phone whitelist).
    pub window: WindowConfig,

    /// Daily pass grants.
    pub passes: PassConfig,

    /// Partner selection knobs.
    pub matching: MatchingConfig,

    /// Profile-completion gate.
    pub gate: GateConfig,
}

impl ChatNightConfig {
    /// Check ranges that serde cannot express.
    ///
    /// ```rust
    /// use matchmaker::{ChatNightConfig, ConfigError};
    ///
    /// let mut config = ChatNightConfig::default();
    /// config.gate.min_completion = 140;
    /// assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "gate.min_completion", .. })));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gate.min_completion > 100 {
            return Err(ConfigError::invalid(
                "gate.min_completion",
                format!("{} exceeds 100", self.gate.min_completion),
            ));
        }
        if self.matching.min_score > 100 {
            return Err(ConfigError::invalid(
                "matching.min_score",
                format!("{} exceeds 100", self.matching.min_score),
            ));
        }
        if self.matching.pair_cooldown_minutes < 0 {
            return Err(ConfigError::invalid(
                "matching.pair_cooldown_minutes",
                "must not be negative",
            ));
        }
        Ok(())
    }
}

/// Daily pass grants.
///
/// Resolution order for a user's total: `test_passes`, then
/// `whitelist_passes` when the user's phone is on the window whitelist, then
/// the category default. Overrides are re-applied every time an entry is
/// read, so changing them affects existing entries without touching the
/// used count. A zero override is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassConfig {
    /// Global override for every user.
    ///
    /// Default: `None`
    pub test_passes: Option<u32>,

    /// Override for whitelisted phones only.
    ///
    /// Default: `None`
    pub whitelist_passes: Option<u32>,

    /// Default: `1`
    pub man_passes: u32,

    /// Default: `2`
    pub woman_passes: u32,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            test_passes: None,
            whitelist_passes: None,
            man_passes: 1,
            woman_passes: 2,
        }
    }
}

/// Partner selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Rank queued candidates by compatibility before falling back to FIFO.
    ///
    /// Default: `false`
    pub scored_enabled: bool,

    /// How many queue entries are considered, in both the scored and the
    /// FIFO path.
    ///
    /// Default: `50`
    pub max_candidates: usize,

    /// The best-ranked candidate is only accepted at or above this score.
    ///
    /// Default: `0`
    pub min_score: u32,

    /// Partners paired with the requester within this many minutes are
    /// skipped. Zero disables the cooldown.
    ///
    /// Default: `30`
    pub pair_cooldown_minutes: i64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            scored_enabled: false,
            max_candidates: 50,
            min_score: 0,
            pair_cooldown_minutes: 30,
        }
    }
}

/// Profile-completion gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Minimum completion percent. Zero disables the gate. The dynamic key
    /// [`MIN_COMPLETION_CONFIG_KEY`] takes precedence when it holds digits.
    pub min_completion: u32,

    /// Count the photo requirement of the base score as met.
    pub bypass_photo_requirement: bool,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
