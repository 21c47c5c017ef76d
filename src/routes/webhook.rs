// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webhook routes for Strava events.

use crate::error::AppError;
use crate::services::{ActivityProcessor, Outcome, RunMode};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhook", get(verify).post(handle_event))
}

/// Strava webhook verification query params.
///
/// All optional so a missing or empty one is a 400 from us rather than a
/// query rejection from axum.
#[derive(Deserialize)]
struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
}

/// Verification response.
#[derive(Serialize, Deserialize, Debug)]
pub struct VerifyResponse {
    #[serde(rename = "hub.challenge")]
    pub challenge: String,
}

/// Verify webhook subscription (GET).
async fn verify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyParams>,
) -> Result<Json<VerifyResponse>, AppError> {
    let present = |value: Option<String>| value.filter(|s| !s.is_empty());
    let (Some(mode), Some(challenge), Some(token)) = (
        present(params.mode),
        present(params.challenge),
        present(params.verify_token),
    ) else {
        tracing::warn!("Webhook verification missing hub parameters");
        return Err(AppError::BadRequest(
            "hub.mode, hub.challenge and hub.verify_token are required".to_string(),
        ));
    };

    let config = state.store.load().await?;
    let expected = config
        .verify_token()
        .ok_or_else(|| AppError::Config("verify_token not found in config store".to_string()))?;

    if !bool::from(token.as_bytes().ct_eq(expected.as_bytes())) {
        tracing::warn!(mode = %mode, "Webhook verification failed: invalid token");
        return Err(AppError::Forbidden);
    }

    tracing::info!(mode = %mode, "Webhook subscription verified");
    Ok(Json(VerifyResponse { challenge }))
}

/// Strava webhook event payload. Only the fields we act on are typed.
#[derive(Deserialize, Debug, Default)]
struct WebhookEvent {
    #[serde(default)]
    object_type: Option<String>, // "activity" or "athlete"
    #[serde(default)]
    object_id: Option<u64>,
    #[serde(default)]
    aspect_type: Option<String>, // "create", "update", "delete"
    #[serde(default)]
    owner_id: Option<u64>,
}

/// Handle incoming webhook events (POST).
///
/// Always answers 200 so Strava does not retry or drop the subscription;
/// every failure is logged here instead.
async fn handle_event(State(state): State<Arc<AppState>>, body: Bytes) -> impl IntoResponse {
    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse webhook event");
            return (StatusCode::OK, "OK");
        }
    };

    tracing::info!(
        object_type = event.object_type.as_deref().unwrap_or_default(),
        object_id = event.object_id,
        aspect_type = event.aspect_type.as_deref().unwrap_or_default(),
        owner_id = event.owner_id,
        "Webhook event received"
    );

    if event.aspect_type.as_deref() != Some("create") {
        tracing::debug!("Ignoring non-create event");
        return (StatusCode::OK, "OK");
    }

    let activity_id = match event.object_id {
        Some(id) if id != 0 => id,
        _ => {
            tracing::warn!("Create event without object_id");
            return (StatusCode::OK, "OK");
        }
    };

    match process_new_activity(&state, activity_id).await {
        Ok(Outcome::Renamed { new_name }) => {
            tracing::info!(activity_id, name = %new_name, "Webhook activity renamed");
        }
        Ok(outcome) => {
            tracing::info!(activity_id, outcome = ?outcome, "Webhook activity left unchanged");
        }
        Err(e) => {
            tracing::error!(activity_id, error = %e, "Failed to process webhook activity");
        }
    }

    (StatusCode::OK, "OK")
}

/// Fresh token, fetch, decide, rename.
async fn process_new_activity(state: &AppState, activity_id: u64) -> Result<Outcome, AppError> {
    let access_token = state.tokens.get_access_token().await?;
    let activity = state.strava.get_activity(&access_token, activity_id).await?;

    ActivityProcessor::new(state.strava.clone(), RunMode::Live)
        .process_one(&access_token, &activity)
        .await
}
