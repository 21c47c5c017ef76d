// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process config store.
//!
//! Backs the backfill CLI when credentials are passed on the command line,
//! and the test suites.

use crate::db::ConfigStore;
use crate::error::{AppError, Result};
use crate::models::strava_config::{REFRESH_TOKEN_FIELD, VERIFY_TOKEN_FIELD};
use crate::models::StravaConfigDoc;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Config store that keeps the document in memory only.
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    doc: Arc<RwLock<Option<StravaConfigDoc>>>,
}

impl InMemoryConfigStore {
    /// Store holding the given document.
    pub fn new(doc: StravaConfigDoc) -> Self {
        Self {
            doc: Arc::new(RwLock::new(Some(doc))),
        }
    }

    /// Store seeded with only a refresh token.
    pub fn with_refresh_token(refresh_token: impl Into<String>) -> Self {
        Self::new(StravaConfigDoc {
            refresh_token: Some(refresh_token.into()),
            verify_token: None,
        })
    }

    /// Store with no document at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Current document contents, if any.
    pub async fn snapshot(&self) -> Option<StravaConfigDoc> {
        self.doc.read().await.clone()
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn load(&self) -> Result<StravaConfigDoc> {
        self.doc.read().await.clone().ok_or_else(|| {
            AppError::Config("Strava config document does not exist".to_string())
        })
    }

    async fn update_field(&self, field: &str, value: &str) -> Result<()> {
        let mut guard = self.doc.write().await;
        let doc = guard.get_or_insert_with(StravaConfigDoc::default);

        match field {
            REFRESH_TOKEN_FIELD => doc.refresh_token = Some(value.to_string()),
            VERIFY_TOKEN_FIELD => doc.verify_token = Some(value.to_string()),
            other => {
                return Err(AppError::Config(format!("Unknown config field: {}", other)));
            }
        }
        Ok(())
    }
}
