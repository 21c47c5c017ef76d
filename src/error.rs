// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type shared by the webhook server and the backfill CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or invalid credentials, or the provider rejected the refresh.
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Strava API error: {0}")]
    StravaApi(String),

    /// Missing persisted config document or required field.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid activity timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message carried by `StravaApi` when the 429 retry budget is exhausted.
    pub const STRAVA_RATE_LIMIT: &'static str = "Rate limit exceeded";

    /// True if this error is a persistent Strava rate limit.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AppError::StravaApi(msg) if msg.contains(Self::STRAVA_RATE_LIMIT))
    }
}

/// Transport failures talking to Strava (connect, timeout, body decode).
impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::StravaApi(e.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Auth(msg) => {
                tracing::error!(error = %msg, "Authentication error");
                (StatusCode::INTERNAL_SERVER_ERROR, "auth_error", None)
            }
            AppError::StravaApi(msg) => {
                (StatusCode::BAD_GATEWAY, "strava_error", Some(msg.clone()))
            }
            AppError::Config(msg) => {
                tracing::error!(error = %msg, "Configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::InvalidTimestamp(msg) | AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", None),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;
