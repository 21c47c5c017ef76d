// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time arithmetic and formatting.

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Timelike, Utc};

/// Length of Strava's short rate-limit window in minutes.
const RATE_LIMIT_WINDOW_MINUTES: u32 = 15;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Next quarter-hour boundary (minute 0, 15, 30 or 45) strictly after the
/// current wall-clock minute. Strava resets its 15-minute budget on these.
pub fn next_rate_limit_reset(now: NaiveDateTime) -> NaiveDateTime {
    let next_minute = (now.minute() / RATE_LIMIT_WINDOW_MINUTES + 1) * RATE_LIMIT_WINDOW_MINUTES;
    let hour_start = now.date().and_hms_opt(now.hour(), 0, 0).unwrap_or(now);
    hour_start + Duration::minutes(i64::from(next_minute))
}

/// Whole seconds from `now` until `then`, truncated, never negative.
pub fn whole_seconds_until(now: NaiveDateTime, then: NaiveDateTime) -> u64 {
    (then - now).num_seconds().max(0) as u64
}
