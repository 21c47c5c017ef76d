// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava activity model as returned by the API.

use serde::{Deserialize, Serialize};

/// Activity category that gets renamed.
pub const WALK: &str = "Walk";

/// Fallback used in logs when Strava omits the name.
const UNNAMED: &str = "Unnamed";

/// The subset of a Strava activity this service reads.
///
/// Both the list endpoint (summary) and the detail endpoint return these
/// fields, so one type serves both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StravaActivity {
    /// Strava activity ID
    pub id: u64,
    /// Category ("Walk", "Run", "Ride", ...)
    #[serde(rename = "type", default)]
    pub activity_type: String,
    /// Indoor flag; Strava may omit it or send null
    #[serde(default)]
    pub trainer: Option<bool>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Start time in the athlete's local timezone, e.g. "2024-12-26T07:30:00Z".
    /// The `Z` is a formatting artifact; the value is wall-clock local time.
    #[serde(default)]
    pub start_date_local: Option<String>,
}

impl StravaActivity {
    pub fn is_walk(&self) -> bool {
        self.activity_type == WALK
    }

    pub fn is_indoor(&self) -> bool {
        self.trainer.unwrap_or(false)
    }

    /// Current name, or "Unnamed" if Strava did not send one.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED)
    }
}
