// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use jsonwebtoken::DecodingKey;
use std::sync::Arc;
use wod_tracker::config::Config;
use wod_tracker::db::FirestoreDb;
use wod_tracker::middleware::auth::create_jwt;
use wod_tracker::routes::create_router;
use wod_tracker::services::{AiCoach, FirebaseTokenVerifier};
use wod_tracker::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
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
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Build app state around `config` with offline dependencies.
///
/// The Firebase verifier uses a fixed key, so no JWKS fetch happens, and
/// no AI provider is configured.
#[allow(dead_code)]
pub fn test_state(config: Config) -> Arc<AppState> {
    let token_verifier = FirebaseTokenVerifier::new_with_static_key(
        &config,
        "test-kid",
        DecodingKey::from_secret(b"unused-test-key"),
    )
    .expect("static verifier");

    Arc::new(AppState {
        config,
        db: test_db_offline(),
        token_verifier: Arc::new(token_verifier),
        coach: AiCoach::new(None, None),
    })
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = test_state(Config::test_default());
    (create_router(state.clone()), state)
}

/// Create a test app whose frontend lives at `frontend_url`.
#[allow(dead_code)]
pub async fn create_test_app_with_frontend_url(
    frontend_url: &str,
) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    let state = test_state(config);
    (create_router(state.clone()), state)
}

/// Session token for `user_id` signed with the app's key.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    create_jwt(user_id, signing_key).expect("JWT creation")
}
