// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Receipt model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Round a currency amount to whole cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// One categorized line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReceiptItem {
    pub name: String,
    pub price: f64,
    pub category: String,
}

/// Stored receipt record, appended to the owner's user document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Receipt {
    /// Original upload file name
    pub file_name: String,
    /// Object path of the image in Cloud Storage
    #[serde(default)]
    pub storage_path: String,
    pub items: Vec<ReceiptItem>,
    pub tax: f64,
    /// Always the item sum plus tax
    pub total: f64,
    /// Card or tender printed on the receipt, when the model could read it
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Cash back earned with `payment_method`
    #[serde(default)]
    pub cashback: f64,
    /// Upload timestamp (ISO 8601)
    pub uploaded_at: String,
}

impl Receipt {
    /// Build a receipt, computing `total` from the items and tax.
    ///
    /// Prices and tax are rounded to cents first, so the stored total is
    /// exactly the stored subtotal plus the stored tax.
    pub fn new(
        file_name: String,
        storage_path: String,
        items: Vec<ReceiptItem>,
        tax: f64,
        uploaded_at: String,
    ) -> Self {
        let items: Vec<ReceiptItem> = items
            .into_iter()
            .map(|item| ReceiptItem {
                price: round_cents(item.price),
                ..item
            })
            .collect();

        let mut receipt = Self {
            file_name,
            storage_path,
            items,
            tax: round_cents(tax),
            total: 0.0,
            payment_method: None,
            cashback: 0.0,
            uploaded_at,
        };
        receipt.total = round_cents(receipt.subtotal() + receipt.tax);
        receipt
    }

    /// Attach the payment method and the cash back it earns at `rate`.
    pub fn with_payment(mut self, payment_method: Option<String>, rate: f64) -> Self {
        self.cashback = match payment_method {
            Some(_) => round_cents(self.total * rate),
            None => 0.0,
        };
        self.payment_method = payment_method;
        self
    }

    /// Sum of the item prices, excluding tax.
    pub fn subtotal(&self) -> f64 {
        round_cents(self.items.iter().map(|i| i.price).sum())
    }
}
