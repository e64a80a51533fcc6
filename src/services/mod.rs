// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - upstream clients and the upload pipeline.

pub mod categorizer;
pub mod google_oauth;
pub mod receipts;
pub mod storage;
pub mod vision;

pub use categorizer::CategorizerClient;
pub use google_oauth::{GoogleOAuthClient, GoogleUserInfo};
pub use receipts::{ReceiptService, ReceiptUpload};
pub use storage::StorageService;
pub use vision::VisionClient;
