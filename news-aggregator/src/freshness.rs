use chrono::{DateTime, Duration, Utc};

/// Cache entries older than this many hours are refetched.
pub const DEFAULT_MAX_AGE_HOURS: u32 = 6;

/// Whether a payload captured at `captured_at` may still be served.
pub fn is_fresh(captured_at: DateTime<Utc>, max_age_hours: u32) -> bool {
    is_fresh_at(captured_at, max_age_hours, Utc::now())
}

/// Fresh iff `now - captured_at` is strictly less than the window. A zero
/// window is never fresh once any time has passed.
pub fn is_fresh_at(captured_at: DateTime<Utc>, max_age_hours: u32, now: DateTime<Utc>) -> bool {
    let window = Duration::hours(i64::from(max_age_hours));
    now.signed_duration_since(captured_at) < window
}

/// Age of an entry in whole minutes, for log lines.
pub fn age_minutes(captured_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(captured_at).num_minutes()
}
