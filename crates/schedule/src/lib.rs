//! # Chat Night Schedule (`schedule`)
//!
//! Time-related building blocks shared by every other Chat Night crate:
//!
//! - [`Clock`]: injectable time source. Production code uses [`SystemClock`];
//!   tests drive [`ManualClock`] to step through windows and room expiry.
//! - [`day_key`]: the `YYYY-MM-DD` calendar date in the fixed IST offset
//!   (UTC+05:30). Pass quotas and ranking tie-breaks are scoped by it.
//! - [`WindowPolicy`]: decides whether matchmaking is open for a caller and
//!   how many seconds remain until the window opens or closes.
//! - [`PhoneWhitelist`]: per-user test override matched on the last ten
//!   digits of a phone number.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use schedule::{WindowConfig, WindowPolicy};
//!
//! let policy = WindowPolicy::new(WindowConfig::default());
//! // 15:00 UTC is 20:30 IST, inside the 20:00-22:00 window.
//! let now = Utc.with_ymd_and_hms(2026, 2, 13, 15, 0, 0).unwrap();
//! let status = policy.status(None, now);
//! assert!(status.is_open);
//! assert_eq!(status.day_key, "2026-02-13");
//! assert_eq!(status.seconds_until_close, 90 * 60);
//! ```

pub mod clock;
pub mod whitelist;
pub mod window;

pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::whitelist::{normalize_phone_last_10, PhoneWhitelist};
pub use crate::window::{
    day_key, local_time, WindowConfig, WindowPolicy, WindowStatus, IST_OFFSET_SECS,
    ROOM_DURATION_MINUTES, UNBOUNDED_CLOSE_SECS, WINDOW_END_HOUR, WINDOW_START_HOUR,
};
