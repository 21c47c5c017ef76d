// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Persisted Strava link configuration.

use serde::{Deserialize, Serialize};

/// Field name of the rotating refresh token in the config document.
pub const REFRESH_TOKEN_FIELD: &str = "refresh_token";
/// Field name of the webhook verification token in the config document.
pub const VERIFY_TOKEN_FIELD: &str = "verify_token";

/// The single config document stored at `auth/strava_config`.
///
/// The access token is never stored here; it only lives for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StravaConfigDoc {
    /// Long-lived refresh token; Strava may rotate it on use
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Shared secret echoed by Strava during webhook subscription
    #[serde(default)]
    pub verify_token: Option<String>,
}

impl StravaConfigDoc {
    /// Refresh token, treating an empty string as missing.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Verify token, treating an empty string as missing.
    pub fn verify_token(&self) -> Option<&str> {
        self.verify_token.as_deref().filter(|t| !t.is_empty())
    }
}
