// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Dog Patrol: give Strava dog walks themed names by time of day
//!
//! This crate provides the webhook server that renames new walks as they
//! are uploaded, and the backfill CLI that renames historical ones.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::ConfigStore;
use services::{StravaClient, TokenManager};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ConfigStore>,
    pub strava: StravaClient,
    pub tokens: TokenManager,
}

impl AppState {
    /// Wire the Strava client and token manager around `store`.
    pub fn new(config: Config, store: Arc<dyn ConfigStore>, strava: StravaClient) -> Self {
        let tokens = TokenManager::new(strava.clone(), store.clone(), (&config).into());
        Self {
            config,
            store,
            strava,
            tokens,
        }
    }
}
