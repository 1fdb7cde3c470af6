//! Time Window Policy.
//!
//! Matchmaking is open daily between [`WINDOW_START_HOUR`] and
//! [`WINDOW_END_HOUR`] IST. Overrides are evaluated first, in priority order:
//!
//! 1. `force_open` configuration
//! 2. `test_mode` toggle
//! 3. caller on the phone whitelist
//!
//! Any override reports the window as open with `seconds_until_open = 0` and
//! [`UNBOUNDED_CLOSE_SECS`] until close. Outside overrides the remaining
//! seconds are exact; after today's window has closed `seconds_until_open`
//! is `-1` and no next deadline is computed.

use chrono::{DateTime, Duration, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::whitelist::PhoneWhitelist;

/// Fixed IST offset from UTC in seconds (+05:30).
pub const IST_OFFSET_SECS: i64 = 5 * 3600 + 30 * 60;
/// Local hour at which the window opens.
pub const WINDOW_START_HOUR: u32 = 20;
/// Local hour at which the window closes.
pub const WINDOW_END_HOUR: u32 = 22;
/// Lifetime of a room from creation.
pub const ROOM_DURATION_MINUTES: i64 = 5;
/// Close countdown reported while an override holds the window open.
pub const UNBOUNDED_CLOSE_SECS: i64 = 99_999;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Wall-clock time in the fixed IST offset.
pub fn local_time(now: DateTime<Utc>) -> NaiveDateTime {
    (now + Duration::seconds(IST_OFFSET_SECS)).naive_utc()
}

/// Calendar date (`YYYY-MM-DD`) in the fixed IST offset.
pub fn day_key(now: DateTime<Utc>) -> String {
    local_time(now).format("%Y-%m-%d").to_string()
}

/// Window overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Keep the window open for everyone.
    #[serde(default)]
    pub force_open: bool,

    /// Test-mode toggle; behaves like `force_open`.
    #[serde(default)]
    pub test_mode: bool,

    /// Comma-separated phone numbers that always see the window open.
    #[serde(default)]
    pub test_users: String,
}

/// Result of a window evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowStatus {
    pub is_open: bool,
    pub day_key: String,
    pub seconds_until_open: i64,
    pub seconds_until_close: i64,
}

/// Decides whether matchmaking is open for a caller at a given instant.
#[derive(Debug, Clone)]
pub struct WindowPolicy {
    config: WindowConfig,
    whitelist: PhoneWhitelist,
}

impl WindowPolicy {
    pub fn new(config: WindowConfig) -> Self {
        let whitelist = PhoneWhitelist::parse(&config.test_users);
        Self { config, whitelist }
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Whether the caller is on the test whitelist.
    pub fn is_whitelisted(&self, phone: Option<&str>) -> bool {
        self.whitelist.contains(phone)
    }

    /// Evaluate the window for a caller identified by phone number.
    pub fn status(&self, phone: Option<&str>, now: DateTime<Utc>) -> WindowStatus {
        let day_key = day_key(now);

        if self.config.force_open || self.config.test_mode || self.is_whitelisted(phone) {
            tracing::trace!(day_key = %day_key, "chat night window held open by override");
            return WindowStatus {
                is_open: true,
                day_key,
                seconds_until_open: 0,
                seconds_until_close: UNBOUNDED_CLOSE_SECS,
            };
        }

        let local = local_time(now);
        let now_ns = i64::from(local.num_seconds_from_midnight()) * NANOS_PER_SEC
            + i64::from(local.nanosecond().min(999_999_999));
        let start_ns = i64::from(WINDOW_START_HOUR) * 3600 * NANOS_PER_SEC;
        let end_ns = i64::from(WINDOW_END_HOUR) * 3600 * NANOS_PER_SEC;

        let (is_open, seconds_until_open, seconds_until_close) = if now_ns < start_ns {
            (
                false,
                (start_ns - now_ns) / NANOS_PER_SEC,
                (end_ns - now_ns) / NANOS_PER_SEC,
            )
        } else if now_ns < end_ns {
            (true, 0, (end_ns - now_ns) / NANOS_PER_SEC)
        } else {
            (false, -1, 0)
        };

        WindowStatus {
            is_open,
            day_key,
            seconds_until_open,
            seconds_until_close,
        }
    }
}
