//! Time helpers with a clock abstraction for testability.
//!
//! Timestamps are Unix epoch milliseconds. They are rendered in JST for the
//! HTTP API.

use chrono::{DateTime, FixedOffset, Utc};

const JST_OFFSET_SECS: i32 = 9 * 3600;

/// Source of the current time, injected so tests can pin it.
pub trait Clock: Send + Sync {
    /// Current Unix timestamp in milliseconds
    fn now_millis(&self) -> i64;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        now_millis()
    }
}

/// Clock that always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    pub fn new(fixed_time_millis: i64) -> Self {
        Self {
            fixed_time: fixed_time_millis,
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.fixed_time
    }
}

/// Current Unix timestamp in milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render a Unix timestamp (milliseconds) as an RFC 3339 string in JST.
///
/// Out-of-range timestamps render as an empty string.
pub fn millis_to_jst_rfc3339(timestamp_millis: i64) -> String {
    let (Some(offset), Some(utc)) = (
        FixedOffset::east_opt(JST_OFFSET_SECS),
        DateTime::<Utc>::from_timestamp_millis(timestamp_millis),
    ) else {
        return String::new();
    };
    utc.with_timezone(&offset).to_rfc3339()
}
