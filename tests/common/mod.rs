// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use smartcards_api::config::Config;
use smartcards_api::db::FirestoreDb;
use smartcards_api::middleware::auth::create_jwt;
use smartcards_api::models::LoginProfile;
use smartcards_api::routes::create_router;
use smartcards_api::services::{
    CategorizerClient, GoogleOAuthClient, ReceiptService, StorageService, VisionClient,
};
use smartcards_api::AppState;
use std::sync::Arc;

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

/// Generate a unique Google ID for test isolation.
#[allow(dead_code)]
pub fn unique_google_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test-{}", nanos)
}

/// Multipart boundary used by [`multipart_body`].
#[allow(dead_code)]
pub const BOUNDARY: &str = "smartcardsTestBoundary";

/// Build a multipart body with one file field.
#[allow(dead_code)]
pub fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Session token for `google_id` signed with the test config key.
#[allow(dead_code)]
pub fn session_token(google_id: &str) -> String {
    create_jwt(google_id, &Config::test_default().jwt_signing_key).unwrap()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

/// Create a test app with a specific frontend URL.
#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    create_test_app_with_config(config)
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    build_test_app(config, FirestoreDb::new_mock(), None)
}

/// Create a test app whose vision, categorizer and Google endpoints all
/// live on `upstream` (a mock server URI), backed by an in-memory database.
#[allow(dead_code)]
pub fn create_test_app_with_upstream(upstream: &str) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.openai_base_url = format!("{}/v1", upstream);
    config.categorizer_url = format!("{}/categorize", upstream);
    build_test_app(config, FirestoreDb::new_in_memory(), Some(upstream))
}

/// Store a signed-in user so protected routes find a document.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, google_id: &str) {
    state
        .db
        .record_login(LoginProfile {
            google_id: google_id.to_string(),
            display_name: "Test User".to_string(),
            email: Some("test@example.com".to_string()),
            photo_url: None,
        })
        .await
        .unwrap();
}

#[allow(dead_code)]
fn build_test_app(
    config: Config,
    db: FirestoreDb,
    oauth_upstream: Option<&str>,
) -> (axum::Router, Arc<AppState>) {
    let vision = VisionClient::new(
        &config.openai_base_url,
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    );
    let categorizer = CategorizerClient::new(config.categorizer_url.clone());
    let receipts = ReceiptService::new(
        vision,
        categorizer,
        StorageService::new_mock(),
        db.clone(),
        config.cashback_rates.clone(),
    );

    let mut oauth = GoogleOAuthClient::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
    );
    if let Some(upstream) = oauth_upstream {
        oauth = oauth.with_endpoints(
            format!("{}/token", upstream),
            format!("{}/userinfo", upstream),
        );
    }

    let state = Arc::new(AppState {
        config,
        db,
        oauth,
        receipts,
    });

    (create_router(state.clone()), state)
}
