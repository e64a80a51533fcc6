// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Receipt upload route.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Receipt, SpendingBreakdown};
use crate::services::ReceiptUpload;
use crate::AppState;
use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

/// Upload routes (require authentication).
pub fn routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(upload_receipt))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UploadResponse {
    pub message: String,
    pub receipt: Receipt,
    pub breakdown: SpendingBreakdown,
}

/// Accept a receipt photo, parse and categorize it, and store the result.
async fn upload_receipt(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let upload = read_receipt_file(&mut multipart).await?;

    tracing::info!(
        google_id = %user.google_id,
        file_name = %upload.file_name,
        content_type = %upload.content_type,
        size = upload.bytes.len(),
        "Receipt upload received"
    );

    let receipt = state
        .receipts
        .process_upload(&user.google_id, upload)
        .await?;
    let breakdown = SpendingBreakdown::from_receipt(&receipt);

    Ok(Json(UploadResponse {
        message: "File uploaded and processed successfully".to_string(),
        receipt,
        breakdown,
    }))
}

/// Pull the `file` field out of the multipart body.
async fn read_receipt_file(multipart: &mut Multipart) -> Result<ReceiptUpload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .unwrap_or("receipt")
            .to_string();

        let content_type = resolve_image_type(field.content_type(), &file_name)
            .ok_or_else(|| AppError::BadRequest("Only image uploads are supported".to_string()))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        if bytes.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }

        return Ok(ReceiptUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(AppError::BadRequest("No file uploaded".to_string()))
}

/// Use the declared image type, or infer one from the extension when the
/// browser sent a generic type.
fn resolve_image_type(declared: Option<&str>, file_name: &str) -> Option<String> {
    match declared {
        Some(ct) if ct.starts_with("image/") => return Some(ct.to_string()),
        Some(ct) if ct != "application/octet-stream" => return None,
        _ => {}
    }

    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    let guessed = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => return None,
    };
    Some(guessed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_declared_image_type() {
        assert_eq!(
            resolve_image_type(Some("image/png"), "x.bin").as_deref(),
            Some("image/png")
        );
    }

    #[test]
    fn test_resolve_rejects_non_image() {
        assert_eq!(resolve_image_type(Some("text/plain"), "x.jpg"), None);
        assert_eq!(resolve_image_type(None, "notes.txt"), None);
        assert_eq!(resolve_image_type(None, "noextension"), None);
    }

    #[test]
    fn test_resolve_guesses_from_extension() {
        assert_eq!(
            resolve_image_type(Some("application/octet-stream"), "IMG_1.JPG").as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(
            resolve_image_type(None, "scan.webp").as_deref(),
            Some("image/webp")
        );
    }
}
