// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Batch rename of historical walks.

use crate::error::{AppError, Result};
use crate::models::RunStats;
use crate::services::{ActivityProcessor, RunMode, StravaClient, TokenManager};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Duration, Utc};

/// Lookback used when neither days nor months is given.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 180;

/// A "month" of lookback, in days.
pub const DAYS_PER_MONTH: i64 = 30;

/// Number of days to look back, from `--days` or `--months`.
///
/// Days take precedence if both are somehow set.
pub fn lookback_days(days: Option<u32>, months: Option<u32>) -> i64 {
    match (days, months) {
        (Some(days), _) => i64::from(days),
        (None, Some(months)) => i64::from(months) * DAYS_PER_MONTH,
        (None, None) => DEFAULT_LOOKBACK_DAYS,
    }
}

/// Cut-off instant `days` before `now`.
///
/// A lookback too large for the calendar is a bad request, not a panic.
pub fn cutoff(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|lookback| now.checked_sub_signed(lookback))
        .ok_or_else(|| AppError::BadRequest(format!("Lookback of {} days is out of range", days)))
}

/// Runs one backfill pass over every activity after a cut-off.
pub struct Backfiller {
    tokens: TokenManager,
    strava: StravaClient,
    mode: RunMode,
}

impl Backfiller {
    pub fn new(tokens: TokenManager, strava: StravaClient, mode: RunMode) -> Self {
        Self {
            tokens,
            strava,
            mode,
        }
    }

    /// Fetch every activity started after `after` and rename eligible walks.
    ///
    /// Token and listing failures abort the run; per-activity failures are
    /// only counted.
    pub async fn run(&self, after: DateTime<Utc>) -> Result<RunStats> {
        let access_token = self.tokens.get_access_token().await?;

        tracing::info!(after = %format_utc_rfc3339(after), "Fetching activities");
        let activities = self
            .strava
            .list_all_activities(&access_token, after.timestamp())
            .await?;

        if activities.is_empty() {
            tracing::info!("No activities found in range");
            return Ok(RunStats::default());
        }

        let processor = ActivityProcessor::new(self.strava.clone(), self.mode);
        let stats = processor.process(&access_token, &activities).await;
        stats.log_summary(self.mode == RunMode::DryRun);

        Ok(stats)
    }
}
