// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed config store.
//!
//! The whole persisted state is one document, `auth/strava_config`, holding
//! the rotating refresh token and the webhook verify token.

use crate::db::{collections, ConfigStore, STRAVA_CONFIG_DOCUMENT};
use crate::error::{AppError, Result};
use crate::models::StravaConfigDoc;
use async_trait::async_trait;
use std::collections::HashMap;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All operations return `AppError::Database`.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }
}

#[async_trait]
impl ConfigStore for FirestoreDb {
    async fn load(&self) -> Result<StravaConfigDoc> {
        let doc: Option<StravaConfigDoc> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::AUTH)
            .obj()
            .one(STRAVA_CONFIG_DOCUMENT)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        doc.ok_or_else(|| {
            AppError::Config(format!(
                "Firestore document {}/{} does not exist",
                collections::AUTH,
                STRAVA_CONFIG_DOCUMENT
            ))
        })
    }

    async fn update_field(&self, field: &str, value: &str) -> Result<()> {
        let mut update = HashMap::new();
        update.insert(field.to_string(), value.to_string());

        // Field mask limits the write to `field`; the other keys stay intact.
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields([field])
            .in_col(collections::AUTH)
            .document_id(STRAVA_CONFIG_DOCUMENT)
            .object(&update)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(field, "Updated config field in Firestore");
        Ok(())
    }
}
