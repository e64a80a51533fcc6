// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloud Storage service for receipt images.
//!
//! Images land in the Firebase Storage bucket under
//! `receipts/{user_id}/{unix_millis}_{file_name}`.

use crate::error::AppError;
use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::http::objects::delete::DeleteObjectRequest;
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
use std::sync::Arc;

/// Object storage service.
#[derive(Clone)]
pub struct StorageService {
    bucket: String,
    client: Option<Arc<Client>>,
}

impl StorageService {
    /// Connect to Cloud Storage using application default credentials.
    pub async fn new(bucket: &str) -> Result<Self, AppError> {
        let config = ClientConfig::default().with_auth().await.map_err(|e| {
            AppError::Storage(format!("Failed to create storage auth config: {}", e))
        })?;

        tracing::info!(bucket, "Cloud Storage client initialized");

        Ok(Self {
            bucket: bucket.to_string(),
            client: Some(Arc::new(Client::new(config))),
        })
    }

    /// Create a mock storage service for testing (offline mode).
    ///
    /// Uploads are skipped; the object path is still returned.
    pub fn new_mock() -> Self {
        Self {
            bucket: "mock-bucket".to_string(),
            client: None,
        }
    }

    /// Upload a receipt image, returning its object path.
    pub async fn upload_receipt_image(
        &self,
        user_id: &str,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        let path = object_path(user_id, file_name, chrono::Utc::now().timestamp_millis());

        let Some(client) = self.client.as_ref() else {
            tracing::debug!(path = %path, "Storage offline, skipping upload");
            return Ok(path);
        };

        let size = bytes.len();
        let mut media = Media::new(path.clone());
        media.content_type = content_type.to_string().into();

        let request = UploadObjectRequest {
            bucket: self.bucket.clone(),
            ..Default::default()
        };

        client
            .upload_object(&request, bytes, &UploadType::Simple(media))
            .await
            .map_err(|e| AppError::Storage(format!("Upload of {} failed: {}", path, e)))?;

        tracing::info!(bucket = %self.bucket, path = %path, size, "Receipt image stored");
        Ok(path)
    }

    /// Remove an uploaded image whose receipt could not be saved.
    pub async fn delete_object(&self, path: &str) -> Result<(), AppError> {
        let Some(client) = self.client.as_ref() else {
            tracing::debug!(path, "Storage offline, skipping delete");
            return Ok(());
        };

        let request = DeleteObjectRequest {
            bucket: self.bucket.clone(),
            object: path.to_string(),
            ..Default::default()
        };

        client
            .delete_object(&request)
            .await
            .map_err(|e| AppError::Storage(format!("Delete of {} failed: {}", path, e)))?;

        tracing::info!(bucket = %self.bucket, path, "Orphaned receipt image removed");
        Ok(())
    }
}

/// Build the object path for an upload.
pub fn object_path(user_id: &str, file_name: &str, unix_millis: i64) -> String {
    let safe_user = urlencoding::encode(user_id);
    let mut safe_name = sanitize_filename::sanitize(file_name).replace(' ', "_");
    if safe_name.is_empty() {
        safe_name = "receipt".to_string();
    }
    format!("receipts/{}/{}_{}", safe_user, unix_millis, safe_name)
}
