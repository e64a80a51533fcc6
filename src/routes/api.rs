// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Receipt, SpendingBreakdown};
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user", get(get_user))
        .route("/api/user/files", get(get_files))
        .route("/api/user/breakdown", get(get_breakdown))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub google_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub last_login: String,
    pub receipt_count: u32,
}

/// Get current user profile.
async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .db
        .get_user(&user.google_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.google_id)))?;

    Ok(Json(UserResponse {
        google_id: profile.google_id,
        display_name: profile.display_name,
        email: profile.email,
        photo_url: profile.photo_url,
        last_login: profile.last_login,
        receipt_count: profile.files.len() as u32,
    }))
}

// ─── Receipts ────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FilesResponse {
    pub files: Vec<Receipt>,
}

/// List the user's receipts in upload order.
async fn get_files(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<FilesResponse>> {
    let files = state.db.get_receipts(&user.google_id).await?;
    tracing::debug!(google_id = %user.google_id, count = files.len(), "Fetched receipts");
    Ok(Json(FilesResponse { files }))
}

/// Spending breakdown across all of the user's receipts.
async fn get_breakdown(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SpendingBreakdown>> {
    let files = state.db.get_receipts(&user.google_id).await?;
    Ok(Json(SpendingBreakdown::from_receipts(&files)))
}
