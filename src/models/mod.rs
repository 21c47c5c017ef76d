// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod stats;
pub mod strava_config;

pub use activity::StravaActivity;
pub use stats::RunStats;
pub use strava_config::StravaConfigDoc;
