// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activity;
pub mod backfill;
pub mod naming;
pub mod rate_limit;
pub mod strava;
pub mod token;

pub use activity::{ActivityProcessor, Decision, Outcome, RunMode, SkipReason};
pub use backfill::Backfiller;
pub use rate_limit::{Clock, SystemClock};
pub use strava::StravaClient;
pub use token::{ClientCredentials, TokenManager};
