// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava rate-limit handling.
//!
//! Strava reports two limit families on every response:
//! - Overall: `X-RateLimit-*` (e.g. 200/15min, 2000/day)
//! - Non-upload reads: `X-ReadRateLimit-*` (e.g. 100/15min, 1000/day), the
//!   one that actually binds for GET/PUT activity calls
//!
//! The 15-minute windows reset at minutes 0, 15, 30 and 45, so on a 429 we
//! sleep until the next boundary instead of backing off exponentially.

use crate::time_utils::{next_rate_limit_reset, whole_seconds_until};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;

/// Attempts per request before a 429 is handed back to the caller.
pub const MAX_ATTEMPTS: u32 = 3;
/// Extra wait after the window reset before retrying.
pub const RESET_BUFFER: Duration = Duration::from_secs(5);
/// Delay after each successful list/fetch/update call.
pub const REQUEST_PACING: Duration = Duration::from_millis(200);

const OVERALL_LIMIT_HEADER: &str = "X-RateLimit-Limit";
const OVERALL_USAGE_HEADER: &str = "X-RateLimit-Usage";
const READ_LIMIT_HEADER: &str = "X-ReadRateLimit-Limit";
const READ_USAGE_HEADER: &str = "X-ReadRateLimit-Usage";

// ─────────────────────────────────────────────────────────────────────────────
// Clock
// ─────────────────────────────────────────────────────────────────────────────

/// Wall clock and sleep, injected so backoff can be tested without waiting.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    async fn sleep(&self, duration: Duration);
}

/// Real clock: local time and tokio sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate limit snapshot
// ─────────────────────────────────────────────────────────────────────────────

/// Usage and limit for one window. Either side may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageWindow {
    pub usage: Option<u32>,
    pub limit: Option<u32>,
}

impl fmt::Display for UsageWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.usage, self.limit) {
            (Some(usage), Some(limit)) => write!(f, "{}/{}", usage, limit),
            (Some(usage), None) => write!(f, "{}/?", usage),
            (None, Some(limit)) => write!(f, "?/{}", limit),
            (None, None) => f.write_str("unknown"),
        }
    }
}

/// One limit family: the 15-minute window and the daily window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimitFamily {
    pub fifteen_min: UsageWindow,
    pub daily: UsageWindow,
}

impl LimitFamily {
    fn from_headers(headers: &HeaderMap, limit_header: &str, usage_header: &str) -> Self {
        let limits = header_pair(headers, limit_header);
        let usages = header_pair(headers, usage_header);

        Self {
            fifteen_min: UsageWindow {
                usage: usages.map(|(short, _)| short),
                limit: limits.map(|(short, _)| short),
            },
            daily: UsageWindow {
                usage: usages.map(|(_, daily)| daily),
                limit: limits.map(|(_, daily)| daily),
            },
        }
    }
}

/// Rate-limit state derived from one response's headers. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    pub overall: LimitFamily,
    pub read: LimitFamily,
}

impl RateLimitSnapshot {
    /// Parse all four headers. Missing or malformed headers are left unknown.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            overall: LimitFamily::from_headers(
                headers,
                OVERALL_LIMIT_HEADER,
                OVERALL_USAGE_HEADER,
            ),
            read: LimitFamily::from_headers(headers, READ_LIMIT_HEADER, READ_USAGE_HEADER),
        }
    }
}

/// Read a `"15min,daily"` header value.
fn header_pair(headers: &HeaderMap, name: &str) -> Option<(u32, u32)> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_pair)
}

fn parse_pair(raw: &str) -> Option<(u32, u32)> {
    let (short, daily) = raw.split_once(',')?;
    Some((short.trim().parse().ok()?, daily.trim().parse().ok()?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Bounded retry
// ─────────────────────────────────────────────────────────────────────────────

/// Retry budget and post-reset buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub reset_buffer: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            reset_buffer: RESET_BUFFER,
        }
    }
}

impl RetryPolicy {
    /// Wait for a 429 seen at `now`: until the next window reset plus buffer.
    pub fn backoff(&self, now: NaiveDateTime) -> (NaiveDateTime, Duration) {
        let reset_at = next_rate_limit_reset(now);
        let wait = Duration::from_secs(whole_seconds_until(now, reset_at)) + self.reset_buffer;
        (reset_at, wait)
    }
}

/// State of one request's retry loop.
///
/// `Attempting` → response → `Completed` (not a 429), `Backoff` (429 with
/// budget left) or `Exhausted` (429 on the last attempt). `Backoff` resumes
/// into the next `Attempting` once the wait has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting {
        attempt: u32,
    },
    Backoff {
        attempt: u32,
        reset_at: NaiveDateTime,
        wait: Duration,
    },
    Exhausted {
        attempts: u32,
    },
    Completed {
        attempts: u32,
    },
}

impl RetryState {
    pub fn start() -> Self {
        RetryState::Attempting { attempt: 1 }
    }

    /// Transition after receiving a response with `status` at `now`.
    ///
    /// Only valid from `Attempting`; other states are returned unchanged.
    pub fn on_response(self, policy: &RetryPolicy, status: StatusCode, now: NaiveDateTime) -> Self {
        let RetryState::Attempting { attempt } = self else {
            return self;
        };

        if status != StatusCode::TOO_MANY_REQUESTS {
            return RetryState::Completed { attempts: attempt };
        }

        if attempt >= policy.max_attempts {
            return RetryState::Exhausted { attempts: attempt };
        }

        let (reset_at, wait) = policy.backoff(now);
        RetryState::Backoff {
            attempt,
            reset_at,
            wait,
        }
    }

    /// Leave `Backoff` for the next attempt. Other states are unchanged.
    pub fn resume(self) -> Self {
        match self {
            RetryState::Backoff { attempt, .. } => RetryState::Attempting {
                attempt: attempt + 1,
            },
            other => other,
        }
    }
}
