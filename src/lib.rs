// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! SmartCards: receipt-based spending breakdowns
//!
//! This crate provides the backend API: Google sign-in, receipt upload,
//! vision-model parsing, item categorization and per-category spending.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::{GoogleOAuthClient, ReceiptService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub oauth: GoogleOAuthClient,
    pub receipts: ReceiptService,
}
