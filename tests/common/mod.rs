// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use dog_patrol::config::Config;
use dog_patrol::db::{ConfigStore, FirestoreDb, InMemoryConfigStore};
use dog_patrol::error::{AppError, Result};
use dog_patrol::models::StravaConfigDoc;
use dog_patrol::routes::create_router;
use dog_patrol::services::{Clock, ClientCredentials, StravaClient, TokenManager};
use dog_patrol::AppState;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Check if emulator is available via environment variable.
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

// ─────────────────────────────────────────────────────────────────────────────
// Clock
// ─────────────────────────────────────────────────────────────────────────────

/// Clock that never really sleeps; each sleep advances `now` and is recorded.
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn at(hour: u32, minute: u32, second: u32) -> Arc<Self> {
        let now = NaiveDate::from_ymd_opt(2024, 12, 26)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap();
        Arc::new(Self {
            now: Mutex::new(now),
            sleeps: Mutex::new(Vec::new()),
        })
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    /// Sleeps longer than request pacing, i.e. rate-limit backoffs.
    pub fn backoffs(&self) -> Vec<Duration> {
        self.sleeps()
            .into_iter()
            .filter(|d| *d > Duration::from_secs(1))
            .collect()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(duration).unwrap();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fake Strava
// ─────────────────────────────────────────────────────────────────────────────

/// Recorded traffic and scripted behavior of the fake Strava API.
pub struct FakeState {
    /// Activities served by list and get, in list order
    pub activities: Mutex<Vec<Value>>,
    /// Status and body returned by the token endpoint
    pub token_response: Mutex<(StatusCode, Value)>,
    /// Form bodies posted to the token endpoint
    pub token_requests: Mutex<Vec<HashMap<String, String>>>,
    /// Query strings of list calls
    pub list_requests: Mutex<Vec<HashMap<String, String>>>,
    /// Activity IDs fetched individually
    pub get_requests: Mutex<Vec<u64>>,
    /// Successful renames, in order
    pub renames: Mutex<Vec<(u64, String)>>,
    /// Activity IDs whose rename returns 500
    pub failing_renames: Mutex<HashSet<u64>>,
    /// Next N requests on any endpoint get a 429
    pub rate_limited_remaining: Mutex<u32>,
    /// Every request that reached a handler, 429s included
    pub request_count: Mutex<u32>,
    /// Authorization headers seen on API calls
    pub auth_headers: Mutex<Vec<String>>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            activities: Mutex::new(Vec::new()),
            token_response: Mutex::new((
                StatusCode::OK,
                json!({
                    "access_token": "access-1",
                    "refresh_token": "refresh-1",
                    "expires_at": 1735200000,
                }),
            )),
            token_requests: Mutex::new(Vec::new()),
            list_requests: Mutex::new(Vec::new()),
            get_requests: Mutex::new(Vec::new()),
            renames: Mutex::new(Vec::new()),
            failing_renames: Mutex::new(HashSet::new()),
            rate_limited_remaining: Mutex::new(0),
            request_count: Mutex::new(0),
            auth_headers: Mutex::new(Vec::new()),
        }
    }
}

impl FakeState {
    pub fn set_activities(&self, activities: Vec<Value>) {
        *self.activities.lock().unwrap() = activities;
    }

    pub fn set_token_response(&self, status: StatusCode, body: Value) {
        *self.token_response.lock().unwrap() = (status, body);
    }

    pub fn rate_limit_next(&self, count: u32) {
        *self.rate_limited_remaining.lock().unwrap() = count;
    }

    pub fn fail_rename(&self, activity_id: u64) {
        self.failing_renames.lock().unwrap().insert(activity_id);
    }

    pub fn renames(&self) -> Vec<(u64, String)> {
        self.renames.lock().unwrap().clone()
    }

    pub fn token_requests(&self) -> Vec<HashMap<String, String>> {
        self.token_requests.lock().unwrap().clone()
    }

    pub fn list_requests(&self) -> Vec<HashMap<String, String>> {
        self.list_requests.lock().unwrap().clone()
    }

    pub fn get_requests(&self) -> Vec<u64> {
        self.get_requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> u32 {
        *self.request_count.lock().unwrap()
    }

    pub fn activity_name(&self, activity_id: u64) -> Option<String> {
        self.activities
            .lock()
            .unwrap()
            .iter()
            .find(|a| a["id"] == activity_id)
            .and_then(|a| a["name"].as_str().map(str::to_string))
    }

    /// Count the request; answer 429 if one is scripted.
    fn throttle(&self) -> Option<Response> {
        *self.request_count.lock().unwrap() += 1;

        let mut remaining = self.rate_limited_remaining.lock().unwrap();
        if *remaining == 0 {
            return None;
        }
        *remaining -= 1;

        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", "200,2000".parse().unwrap());
        headers.insert("x-ratelimit-usage", "201,950".parse().unwrap());
        headers.insert("x-readratelimit-limit", "100,1000".parse().unwrap());
        headers.insert("x-readratelimit-usage", "101,600".parse().unwrap());
        Some(
            (
                StatusCode::TOO_MANY_REQUESTS,
                headers,
                Json(json!({"message": "Rate Limit Exceeded"})),
            )
                .into_response(),
        )
    }

    fn record_auth(&self, headers: &HeaderMap) {
        let value = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.auth_headers.lock().unwrap().push(value);
    }
}

/// In-process Strava API on an ephemeral port.
pub struct FakeStrava {
    pub state: Arc<FakeState>,
    pub base_url: String,
}

impl FakeStrava {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());

        let app = Router::new()
            .route("/oauth/token", post(token))
            .route("/api/v3/athlete/activities", get(list_activities))
            .route(
                "/api/v3/activities/{id}",
                get(get_activity).put(update_activity),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake Strava");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            base_url: format!("http://{}", addr),
        }
    }

    /// Config pointing the client at this server.
    pub fn config(&self) -> Config {
        Config {
            strava_api_base: format!("{}/api/v3", self.base_url),
            strava_token_url: format!("{}/oauth/token", self.base_url),
            ..Config::default()
        }
    }

    /// Client against this server with a manual clock.
    pub fn client(&self, clock: Arc<ManualClock>) -> StravaClient {
        StravaClient::new(&self.config()).with_clock(clock)
    }
}

async fn token(
    State(state): State<Arc<FakeState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if let Some(limited) = state.throttle() {
        return limited;
    }
    state.token_requests.lock().unwrap().push(form);
    let (status, body) = state.token_response.lock().unwrap().clone();
    (status, Json(body)).into_response()
}

async fn list_activities(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(limited) = state.throttle() {
        return limited;
    }
    state.record_auth(&headers);

    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page: usize = query
        .get("per_page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(30);
    state.list_requests.lock().unwrap().push(query);

    let activities = state.activities.lock().unwrap();
    let batch: Vec<Value> = activities
        .iter()
        .skip((page.saturating_sub(1)) * per_page)
        .take(per_page)
        .cloned()
        .collect();
    Json(batch).into_response()
}

async fn get_activity(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    if let Some(limited) = state.throttle() {
        return limited;
    }
    state.record_auth(&headers);
    state.get_requests.lock().unwrap().push(id);

    let activities = state.activities.lock().unwrap();
    match activities.iter().find(|a| a["id"] == id) {
        Some(activity) => Json(activity.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Record Not Found"})),
        )
            .into_response(),
    }
}

async fn update_activity(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(limited) = state.throttle() {
        return limited;
    }
    state.record_auth(&headers);

    if state.failing_renames.lock().unwrap().contains(&id) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "boom"})),
        )
            .into_response();
    }

    let Some(name) = body["name"].as_str().map(str::to_string) else {
        return (StatusCode::BAD_REQUEST, "missing name").into_response();
    };

    let mut activities = state.activities.lock().unwrap();
    let Some(activity) = activities.iter_mut().find(|a| a["id"] == id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    activity["name"] = json!(name);
    let updated = activity.clone();
    drop(activities);

    state.renames.lock().unwrap().push((id, name));
    Json(updated).into_response()
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

/// Activity JSON as Strava returns it (only the fields we read).
pub fn activity_json(
    id: u64,
    activity_type: &str,
    trainer: bool,
    start: &str,
    name: &str,
) -> Value {
    json!({
        "id": id,
        "type": activity_type,
        "trainer": trainer,
        "start_date_local": start,
        "name": name,
        "distance": 2150.3,
    })
}

/// Config store that fails every call with a database error.
pub struct FailingStore {
    pub doc: StravaConfigDoc,
}

#[async_trait]
impl ConfigStore for FailingStore {
    async fn load(&self) -> Result<StravaConfigDoc> {
        Ok(self.doc.clone())
    }

    async fn update_field(&self, _field: &str, _value: &str) -> Result<()> {
        Err(AppError::Database("write refused".to_string()))
    }
}

/// Token manager over `store` talking to `fake`.
pub fn token_manager(
    fake: &FakeStrava,
    clock: Arc<ManualClock>,
    store: Arc<dyn ConfigStore>,
) -> TokenManager {
    TokenManager::new(
        fake.client(clock),
        store,
        ClientCredentials::new("test_client_id", "test_secret"),
    )
}

/// Router wired to `fake` and an in-memory store.
pub fn create_test_app(
    fake: &FakeStrava,
    store: InMemoryConfigStore,
) -> (axum::Router, Arc<AppState>) {
    let config = fake.config();
    let strava = fake.client(ManualClock::at(12, 0, 0));
    let state = Arc::new(AppState::new(config, Arc::new(store), strava));
    (create_router(state.clone()), state)
}

/// Router whose store has no connection at all.
pub fn create_offline_test_app() -> axum::Router {
    let config = Config::default();
    let strava = StravaClient::new(&config);
    let state = Arc::new(AppState::new(
        config,
        Arc::new(FirestoreDb::new_mock()),
        strava,
    ));
    create_router(state)
}
