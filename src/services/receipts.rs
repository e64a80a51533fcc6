// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Receipt upload pipeline.
//!
//! check owner → verify → extract → categorize → store image → append to
//! user document. Each step is a single upstream call; the first failure
//! aborts the upload, and an image stored for a receipt that could not be
//! saved is removed again.

use crate::config::CashbackRates;
use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Receipt, ReceiptItem};
use crate::services::categorizer::CategorizerClient;
use crate::services::storage::StorageService;
use crate::services::vision::{ParsedItem, ReceiptImage, VisionClient};

/// An uploaded file as received from the browser.
#[derive(Debug, Clone)]
pub struct ReceiptUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Orchestrates the upstream services for one upload.
#[derive(Clone)]
pub struct ReceiptService {
    vision: VisionClient,
    categorizer: CategorizerClient,
    storage: StorageService,
    db: FirestoreDb,
    cashback_rates: CashbackRates,
}

impl ReceiptService {
    pub fn new(
        vision: VisionClient,
        categorizer: CategorizerClient,
        storage: StorageService,
        db: FirestoreDb,
        cashback_rates: CashbackRates,
    ) -> Self {
        Self {
            vision,
            categorizer,
            storage,
            db,
            cashback_rates,
        }
    }

    /// Process an upload end to end and return the stored receipt.
    pub async fn process_upload(
        &self,
        user_id: &str,
        upload: ReceiptUpload,
    ) -> Result<Receipt, AppError> {
        if self.db.get_user(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let image = ReceiptImage {
            content_type: &upload.content_type,
            bytes: &upload.bytes,
        };

        if !self.vision.verify_receipt(&image).await? {
            tracing::info!(user_id, file_name = %upload.file_name, "Rejected upload: not a receipt");
            return Err(AppError::BadRequest(
                "The uploaded image is not a receipt".to_string(),
            ));
        }

        let parsed = self.vision.extract_items(&image).await?;
        if parsed.items.is_empty() {
            return Err(AppError::BadRequest(
                "No items could be read from the receipt".to_string(),
            ));
        }

        let names: Vec<String> = parsed.items.iter().map(|i| i.name.clone()).collect();
        let categories = self.categorizer.categorize(&names).await?;
        let items = categorize_items(parsed.items, categories);

        let storage_path = self
            .storage
            .upload_receipt_image(user_id, &upload.file_name, &upload.content_type, upload.bytes)
            .await?;

        let rate = parsed
            .payment_method
            .as_deref()
            .map(|m| self.cashback_rates.rate_for(m))
            .unwrap_or(0.0);

        let receipt = Receipt::new(
            upload.file_name,
            storage_path,
            items,
            parsed.tax,
            chrono::Utc::now().to_rfc3339(),
        )
        .with_payment(parsed.payment_method, rate);

        if let Err(e) = self.db.append_receipt(user_id, &receipt).await {
            if let Err(cleanup) = self.storage.delete_object(&receipt.storage_path).await {
                tracing::warn!(error = %cleanup, path = %receipt.storage_path, "Failed to remove orphaned image");
            }
            return Err(e);
        }

        tracing::info!(
            user_id,
            items = receipt.items.len(),
            total = receipt.total,
            cashback = receipt.cashback,
            "Receipt processed"
        );

        Ok(receipt)
    }
}

/// Zip parsed items with their category labels.
fn categorize_items(items: Vec<ParsedItem>, categories: Vec<String>) -> Vec<ReceiptItem> {
    items
        .into_iter()
        .zip(categories)
        .map(|(item, category)| ReceiptItem {
            name: item.name,
            price: item.price,
            category,
        })
        .collect()
}
