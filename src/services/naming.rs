// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Time-of-day naming policy for dog walks.
//!
//! - 04:00 - 10:59: Morning Shakeout
//! - 11:00 - 13:59: Lunch Break Sniffari
//! - 14:00 - 03:59: Evening Patrol

use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveDateTime, Timelike};

pub const MORNING_LABEL: &str = "Morning Shakeout 🐕‍🦺";
pub const LUNCH_LABEL: &str = "Lunch Break Sniffari 👃🐕‍🦺";
pub const EVENING_LABEL: &str = "Evening Patrol 🐕‍🦺";

/// Substrings that mark a name as already dog-themed.
const THEME_MARKERS: [&str; 4] = ["Dog Patrol", "Sniffari", "🐕", "👃"];

/// Time-of-day slot a walk falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Morning,
    Lunch,
    Evening,
}

impl Theme {
    /// Slot for an hour of day (0-23).
    pub fn for_hour(hour: u32) -> Self {
        match hour {
            4..=10 => Theme::Morning,
            11..=13 => Theme::Lunch,
            _ => Theme::Evening,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Morning => MORNING_LABEL,
            Theme::Lunch => LUNCH_LABEL,
            Theme::Evening => EVENING_LABEL,
        }
    }
}

/// Parse Strava's `start_date_local` into its wall-clock time.
///
/// The value is already local; a trailing `Z` is only formatting and an
/// explicit offset is ignored rather than converted.
pub fn parse_local_timestamp(start_date_local: &str) -> Result<NaiveDateTime> {
    let trimmed = start_date_local.trim();
    let naive = trimmed.strip_suffix('Z').unwrap_or(trimmed);

    NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M"))
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.naive_local()))
        .map_err(|_| AppError::InvalidTimestamp(start_date_local.to_string()))
}

/// Theme label for an activity starting at `start_date_local`.
pub fn name_for(start_date_local: &str) -> Result<&'static str> {
    let local = parse_local_timestamp(start_date_local)?;
    Ok(Theme::for_hour(local.hour()).label())
}

/// True if `name` already carries some dog theme.
///
/// Only a reporting signal: whether to rename is decided by exact equality
/// with the freshly computed label.
pub fn is_already_themed(name: &str) -> bool {
    THEME_MARKERS.iter().any(|marker| name.contains(marker))
}
