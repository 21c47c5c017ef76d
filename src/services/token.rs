// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access token lifecycle for the single linked Strava account.
//!
//! Every processing unit (one webhook event, one backfill run) starts with a
//! fresh refresh. Nothing is cached across units.

use crate::config::Config;
use crate::db::ConfigStore;
use crate::error::{AppError, Result};
use crate::models::strava_config::REFRESH_TOKEN_FIELD;
use crate::services::StravaClient;
use std::sync::Arc;

/// OAuth application credentials.
#[derive(Debug, Clone, Default)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    fn is_complete(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }
}

impl From<&Config> for ClientCredentials {
    fn from(config: &Config) -> Self {
        Self::new(&config.strava_client_id, &config.strava_client_secret)
    }
}

/// Obtains access tokens and persists rotated refresh tokens.
#[derive(Clone)]
pub struct TokenManager {
    client: StravaClient,
    store: Arc<dyn ConfigStore>,
    credentials: ClientCredentials,
}

impl TokenManager {
    pub fn new(
        client: StravaClient,
        store: Arc<dyn ConfigStore>,
        credentials: ClientCredentials,
    ) -> Self {
        Self {
            client,
            store,
            credentials,
        }
    }

    /// Get a fresh access token using the stored refresh token.
    ///
    /// If Strava hands back a different refresh token it is written to the
    /// config store before returning. The old one stops working once a new
    /// one is issued, so a failed write fails the whole refresh.
    pub async fn get_access_token(&self) -> Result<String> {
        let config = self.store.load().await?;

        let refresh_token = config
            .refresh_token()
            .ok_or_else(|| AppError::Auth("refresh_token not found in config store".to_string()))?;

        if !self.credentials.is_complete() {
            return Err(AppError::Auth(
                "STRAVA_CLIENT_ID and STRAVA_CLIENT_SECRET must be set".to_string(),
            ));
        }

        let tokens = self
            .client
            .refresh_token(
                &self.credentials.client_id,
                &self.credentials.client_secret,
                refresh_token,
            )
            .await?;

        if tokens.access_token.is_empty() {
            return Err(AppError::Auth(
                "Token response did not contain an access token".to_string(),
            ));
        }

        match tokens.refresh_token.as_deref() {
            Some(new_refresh) if !new_refresh.is_empty() && new_refresh != refresh_token => {
                self.store
                    .update_field(REFRESH_TOKEN_FIELD, new_refresh)
                    .await
                    .map_err(|e| {
                        tracing::error!(error = %e, "Failed to persist rotated refresh token");
                        e
                    })?;
                tracing::info!("Refresh token rotated and persisted");
            }
            _ => tracing::debug!("Refresh token unchanged"),
        }

        tracing::info!("Access token obtained");
        Ok(tokens.access_token)
    }
}
