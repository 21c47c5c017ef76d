// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Set FIRESTORE_EMULATOR_HOST to run them; otherwise they are skipped.
//!
//! Each test uses its own project ID, so it starts from an empty database.

use dog_patrol::db::{ConfigStore, FirestoreDb};
use dog_patrol::error::AppError;
use dog_patrol::models::strava_config::{REFRESH_TOKEN_FIELD, VERIFY_TOKEN_FIELD};

mod common;

/// Fresh emulator database for one test.
async fn isolated_db() -> FirestoreDb {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    FirestoreDb::new(&format!("dog-patrol-test-{}", nanos))
        .await
        .expect("Failed to connect to Firestore emulator")
}

#[tokio::test]
async fn test_missing_document_is_config_error() {
    require_emulator!();
    let db = isolated_db().await;

    let result = db.load().await;
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[tokio::test]
async fn test_update_field_keeps_other_fields() {
    require_emulator!();
    let db = isolated_db().await;

    db.update_field(VERIFY_TOKEN_FIELD, "verify-me").await.unwrap();
    db.update_field(REFRESH_TOKEN_FIELD, "refresh-0").await.unwrap();
    db.update_field(REFRESH_TOKEN_FIELD, "refresh-1").await.unwrap();

    let doc = db.load().await.unwrap();
    assert_eq!(doc.refresh_token(), Some("refresh-1"));
    assert_eq!(doc.verify_token(), Some("verify-me"));
}

#[tokio::test]
async fn test_shared_project_round_trip() {
    require_emulator!();
    let db = common::test_db().await;

    db.update_field(REFRESH_TOKEN_FIELD, "shared-refresh")
        .await
        .unwrap();

    let doc = db.load().await.unwrap();
    assert_eq!(doc.refresh_token(), Some("shared-refresh"));
}

#[tokio::test]
async fn test_offline_store_is_database_error() {
    let db = FirestoreDb::new_mock();

    assert!(matches!(db.load().await, Err(AppError::Database(_))));
    assert!(matches!(
        db.update_field(REFRESH_TOKEN_FIELD, "x").await,
        Err(AppError::Database(_))
    ));
}
