// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dog Patrol webhook server
//!
//! Receives Strava activity events and renames new dog walks.

use dog_patrol::{config::Config, db::FirestoreDb, services::StravaClient, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Dog Patrol webhook server");

    if config.strava_client_id.is_empty() || config.strava_client_secret.is_empty() {
        tracing::warn!(
            "STRAVA_CLIENT_ID or STRAVA_CLIENT_SECRET unset; events will fail to refresh tokens"
        );
    }

    // Config store holding the refresh and verify tokens
    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    let strava = StravaClient::new(&config);
    let state = Arc::new(AppState::new(config.clone(), Arc::new(db), strava));

    // Build router
    let app = dog_patrol::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dog_patrol=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
