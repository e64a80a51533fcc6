// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Cloud Run injects secrets as environment variables via secret bindings,
//! so everything is read once at startup.

use axum::http::Uri;
use std::env;

/// Default upload size limit (10 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default cash back per payment method, as `method=rate` pairs.
const DEFAULT_CASHBACK_RATES: &str = "amex=0.02,visa=0.015,mastercard=0.015,discover=0.01";

/// Hosts allowed as frontends during local development.
const LOCAL_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Frontend URL for OAuth redirects
    pub frontend_url: String,
    /// Public URL of this API (used for the OAuth callback)
    pub api_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Cloud Storage bucket holding receipt images
    pub storage_bucket: String,
    /// OpenAI-compatible API base URL
    pub openai_base_url: String,
    /// Vision model name
    pub openai_model: String,
    /// Categorization service endpoint
    pub categorizer_url: String,
    /// Maximum accepted upload body size in bytes
    pub max_upload_bytes: usize,
    /// Cash back earned per payment method
    pub cashback_rates: CashbackRates,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for the OAuth state parameter
    pub oauth_state_key: Vec<u8>,
    /// OpenAI API key
    pub openai_api_key: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        Ok(Self {
            google_client_id: required("GOOGLE_CLIENT_ID")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            api_url: env::var("API_URL").unwrap_or_else(|_| format!("http://localhost:{}", port)),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| "local-dev.appspot.com".to_string()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            categorizer_url: env::var("CATEGORIZER_URL")
                .unwrap_or_else(|_| "http://localhost:8000/categorize".to_string()),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            cashback_rates: CashbackRates::parse(
                &env::var("CASHBACK_RATES")
                    .unwrap_or_else(|_| DEFAULT_CASHBACK_RATES.to_string()),
            )?,
            port,

            google_client_secret: required("GOOGLE_CLIENT_SECRET")?,
            jwt_signing_key: required("JWT_SIGNING_KEY")?.into_bytes(),
            oauth_state_key: required("OAUTH_STATE_KEY")?.into_bytes(),
            openai_api_key: required("OPENAI_API_KEY")?,
        })
    }

    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            google_client_id: "test_client_id.apps.googleusercontent.com".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            api_url: "http://localhost:8080".to_string(),
            gcp_project_id: "test-project".to_string(),
            storage_bucket: "test-project.appspot.com".to_string(),
            openai_base_url: "http://127.0.0.1:9/v1".to_string(),
            openai_model: "gpt-4o".to_string(),
            categorizer_url: "http://127.0.0.1:9/categorize".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cashback_rates: CashbackRates::parse(DEFAULT_CASHBACK_RATES).unwrap_or_default(),
            port: 8080,
            google_client_secret: "test_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
            openai_api_key: "sk-test".to_string(),
        }
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn is_https(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }

    /// Whether `origin` may receive credentialed CORS responses and OAuth
    /// redirects: the configured frontend, or plain-HTTP localhost on any port.
    pub fn is_allowed_frontend(&self, origin: &str) -> bool {
        if origin.trim_end_matches('/') == self.frontend_url.trim_end_matches('/') {
            return true;
        }

        let Ok(uri) = origin.parse::<Uri>() else {
            return false;
        };
        let Some(authority) = uri.authority() else {
            return false;
        };

        uri.scheme_str() == Some("http")
            && !authority.as_str().contains('@')
            && LOCAL_HOSTS.contains(&authority.host())
    }
}

/// Cash back rates keyed by a lowercase payment method name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CashbackRates(Vec<(String, f64)>);

impl CashbackRates {
    /// Parse `method=rate` pairs separated by commas, e.g. `visa=0.015`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (method, rate) = entry
                    .split_once('=')
                    .ok_or_else(|| ConfigError::Invalid("CASHBACK_RATES", entry.to_string()))?;
                let rate: f64 = rate
                    .trim()
                    .parse()
                    .ok()
                    .filter(|r: &f64| (0.0..1.0).contains(r))
                    .ok_or_else(|| ConfigError::Invalid("CASHBACK_RATES", entry.to_string()))?;
                Ok((method.trim().to_lowercase(), rate))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Rate for a payment method as printed on a receipt.
    ///
    /// Matches the first configured name contained in the method, so
    /// `VISA DEBIT ****1234` earns the `visa` rate. Unknown methods earn 0.
    pub fn rate_for(&self, payment_method: &str) -> f64 {
        let method = payment_method.to_lowercase();
        self.0
            .iter()
            .find(|(name, _)| method.contains(name.as_str()))
            .map(|(_, rate)| *rate)
            .unwrap_or(0.0)
    }
}

/// Read a required variable, trimming trailing whitespace from secret bindings.
fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
