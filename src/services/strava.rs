// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for fetching and renaming activities.
//!
//! Handles:
//! - Access token refresh (form POST to the OAuth endpoint)
//! - Activity fetching, single and paginated
//! - Activity renames
//! - 429 backoff aligned to Strava's 15-minute windows, plus request pacing

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::StravaActivity;
use crate::services::rate_limit::{
    Clock, RateLimitSnapshot, RetryPolicy, RetryState, SystemClock, REQUEST_PACING,
};
use reqwest::{Method, Request, Response};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Page size for the activity list endpoint (Strava maximum is 200).
pub const PAGE_SIZE: u32 = 100;

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Strava API client.
///
/// Calls are issued one at a time by the caller; nothing here runs in the
/// background.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    api_base: String,
    token_url: String,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl StravaClient {
    /// Create a client against the API base and token URL from `config`.
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            api_base: config.strava_api_base.clone(),
            token_url: config.strava_token_url.clone(),
            policy: RetryPolicy::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for backoff and pacing.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Exchange a refresh token for a fresh access token.
    ///
    /// Goes through the 429 retry loop (the OAuth endpoint shares the
    /// overall budget) but is not paced. Any non-2xx is an auth failure.
    pub async fn refresh_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse> {
        let request = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .build()
            .map_err(|e| AppError::Auth(format!("Token refresh request failed: {}", e)))?;

        let response = self
            .send(request)
            .await
            .map_err(|e| AppError::Auth(format!("Token refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Strava token refresh failed");
            return Err(AppError::Auth(format!(
                "Failed to refresh token: {}",
                status.as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to parse token response: {}", e)))
    }

    /// Get an activity by ID.
    pub async fn get_activity(
        &self,
        access_token: &str,
        activity_id: u64,
    ) -> Result<StravaActivity> {
        let url = format!("{}/activities/{}", self.api_base, activity_id);
        let request = self.authorized(Method::GET, &url, access_token).build()?;
        let activity = self.check_response_json(self.send(request).await?).await?;
        self.pace().await;
        Ok(activity)
    }

    /// List one page of activities started after `after` (Unix timestamp).
    pub async fn list_activities(
        &self,
        access_token: &str,
        after: i64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StravaActivity>> {
        let url = format!("{}/athlete/activities", self.api_base);
        let request = self
            .authorized(Method::GET, &url, access_token)
            .query(&[
                ("after", after.to_string()),
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ])
            .build()?;

        let activities = self.check_response_json(self.send(request).await?).await?;
        self.pace().await;
        Ok(activities)
    }

    /// List every activity started after `after`, in the order Strava
    /// returns them. Stops at the first empty page.
    pub async fn list_all_activities(
        &self,
        access_token: &str,
        after: i64,
    ) -> Result<Vec<StravaActivity>> {
        let mut activities = Vec::new();
        let mut page = 1;

        loop {
            let batch = self
                .list_activities(access_token, after, page, PAGE_SIZE)
                .await?;
            if batch.is_empty() {
                break;
            }

            tracing::info!(page, count = batch.len(), "Fetched activity page");
            activities.extend(batch);
            page += 1;
        }

        tracing::info!(total = activities.len(), "Fetched all activities");
        Ok(activities)
    }

    /// Rename an activity.
    pub async fn update_activity_name(
        &self,
        access_token: &str,
        activity_id: u64,
        name: &str,
    ) -> Result<()> {
        let url = format!("{}/activities/{}", self.api_base, activity_id);
        let body = serde_json::json!({ "name": name });
        let request = self
            .authorized(Method::PUT, &url, access_token)
            .json(&body)
            .build()?;

        self.check_response(self.send(request).await?).await?;
        self.pace().await;
        Ok(())
    }

    fn authorized(&self, method: Method, url: &str, access_token: &str) -> reqwest::RequestBuilder {
        self.http.request(method, url).bearer_auth(access_token)
    }

    /// Execute `request`, retrying on 429 per the retry policy.
    ///
    /// Returns the first non-429 response, or the last 429 once the budget
    /// is exhausted. Status classification is left to the caller.
    async fn send(&self, request: Request) -> Result<Response> {
        let mut state = RetryState::start();

        loop {
            let RetryState::Attempting { attempt } = state else {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "retry loop resumed in state {:?}",
                    state
                )));
            };

            let attempt_request = request.try_clone().ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("request body cannot be replayed"))
            })?;
            let response = self.http.execute(attempt_request).await?;

            state = state.on_response(&self.policy, response.status(), self.clock.now());
            match state {
                RetryState::Backoff {
                    attempt,
                    reset_at,
                    wait,
                } => {
                    let limits = RateLimitSnapshot::from_headers(response.headers());
                    tracing::warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        url = %request.url().path(),
                        overall_15min = %limits.overall.fifteen_min,
                        overall_daily = %limits.overall.daily,
                        read_15min = %limits.read.fifteen_min,
                        read_daily = %limits.read.daily,
                        reset_at = %reset_at.format("%H:%M:%S"),
                        wait_secs = wait.as_secs(),
                        "Strava rate limit hit (429), waiting for window reset"
                    );
                    self.clock.sleep(wait).await;
                    state = state.resume();
                }
                RetryState::Exhausted { attempts } => {
                    tracing::warn!(
                        attempts,
                        url = %request.url().path(),
                        "Strava rate limit persisted, giving up"
                    );
                    return Ok(response);
                }
                _ => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Strava request succeeded after backoff");
                    }
                    return Ok(response);
                }
            }
        }
    }

    /// Stay under the read budget even before Strava starts refusing.
    async fn pace(&self) {
        self.clock.sleep(REQUEST_PACING).await;
    }

    /// Check response status and return error if not successful.
    async fn check_response(&self, response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            return Err(AppError::StravaApi(AppError::STRAVA_RATE_LIMIT.to_string()));
        }

        Err(AppError::StravaApi(format!("HTTP {}: {}", status, body)))
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T> {
        self.check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))
    }
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    /// Present when Strava rotates (or re-issues) the refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,
}
