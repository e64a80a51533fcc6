// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SmartCards API Server
//!
//! Signs users in with Google, parses uploaded receipts with a vision model
//! and serves per-category spending breakdowns to the frontend.

use smartcards_api::{
    config::Config,
    db::FirestoreDb,
    services::{
        CategorizerClient, GoogleOAuthClient, ReceiptService, StorageService, VisionClient,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting SmartCards API");

    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    let storage = StorageService::new(&config.storage_bucket).await?;

    let vision = VisionClient::new(
        &config.openai_base_url,
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    );
    tracing::info!(model = %config.openai_model, "Vision client initialized");

    let categorizer = CategorizerClient::new(config.categorizer_url.clone());
    tracing::info!(url = %config.categorizer_url, "Categorizer client initialized");

    let receipts = ReceiptService::new(
        vision,
        categorizer,
        storage,
        db.clone(),
        config.cashback_rates.clone(),
    );

    let oauth = GoogleOAuthClient::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        oauth,
        receipts,
    });

    // Build router
    let app = smartcards_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("smartcards_api=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
