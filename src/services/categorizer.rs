// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the external item categorization service.
//!
//! POST `{"items": [...]}` returns `{"categories": [...]}`, one label per
//! item in the same order.

use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Label used when the service gives no usable category for an item.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Serialize)]
struct CategorizeRequest<'a> {
    items: &'a [String],
}

#[derive(Deserialize)]
struct CategorizeResponse {
    #[serde(default)]
    categories: Vec<Option<String>>,
}

/// Categorization service client.
#[derive(Clone)]
pub struct CategorizerClient {
    http: reqwest::Client,
    url: String,
}

impl CategorizerClient {
    pub fn new(url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
        }
    }

    /// Categorize item names, returning one label per name.
    pub async fn categorize(&self, names: &[String]) -> Result<Vec<String>, AppError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .http
            .post(&self.url)
            .json(&CategorizeRequest { items: names })
            .send()
            .await
            .map_err(|e| AppError::Categorizer(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Categorizer(format!("HTTP {}: {}", status, body)));
        }

        let body: CategorizeResponse = response
            .json()
            .await
            .map_err(|e| AppError::Categorizer(format!("JSON parse error: {}", e)))?;

        if body.categories.len() != names.len() {
            tracing::warn!(
                requested = names.len(),
                returned = body.categories.len(),
                "Categorizer returned a mismatched label count"
            );
        }

        Ok(align_categories(names.len(), body.categories))
    }
}

/// Pad or truncate labels to `count`, replacing blanks with [`UNCATEGORIZED`].
pub fn align_categories(count: usize, labels: Vec<Option<String>>) -> Vec<String> {
    let mut labels = labels.into_iter();
    (0..count)
        .map(|_| {
            labels
                .next()
                .flatten()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| UNCATEGORIZED.to_string())
        })
        .collect()
}
