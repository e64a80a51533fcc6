// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth authentication routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

/// How long a consent round trip may take before its state is refused.
const STATE_MAX_AGE_MS: u128 = 10 * 60 * 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/google", get(auth_start))
        .route("/auth/google/callback", get(auth_callback))
        .route("/auth/logout", post(logout))
}

/// Query parameters for starting OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Frontend URL to redirect back to after OAuth completes.
    /// If not provided, uses FRONTEND_URL env var.
    #[serde(default)]
    redirect_uri: Option<String>,
}

/// Start OAuth flow - redirect to the Google consent screen.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthStartParams>,
) -> Result<Redirect> {
    let frontend_url = match params.redirect_uri {
        Some(url) if state.config.is_allowed_frontend(&url) => url,
        Some(url) => {
            tracing::warn!(redirect_uri = %url, "Ignoring disallowed redirect_uri");
            state.config.frontend_url.clone()
        }
        None => state.config.frontend_url.clone(),
    };

    let oauth_state = sign_state(&frontend_url, now_millis()?, &state.config.oauth_state_key)?;
    let auth_url = state
        .oauth
        .authorize_url(&callback_url(&state.config), &oauth_state);

    tracing::info!(frontend_url = %frontend_url, "Starting OAuth flow, redirecting to Google");

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code, record the login, set the session cookie.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    let frontend_url = params
        .state
        .as_deref()
        .and_then(|s| {
            verify_and_decode_state(s, &state.config.oauth_state_key, now_millis().ok()?)
        })
        .ok_or_else(|| {
            tracing::warn!("Invalid, expired or tampered OAuth state parameter");
            AppError::BadRequest("Invalid OAuth state".to_string())
        })?;

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        let redirect = format!("{}/?error={}", frontend_url, urlencoding::encode(&error));
        return Ok((jar, Redirect::temporary(&redirect)));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    tracing::info!("Exchanging authorization code for tokens");

    let tokens = state
        .oauth
        .exchange_code(&code, &callback_url(&state.config))
        .await?;
    let info = state.oauth.fetch_user_info(&tokens.access_token).await?;
    let user = state.db.record_login(info.into_login_profile()).await?;

    let jwt = create_jwt(&user.google_id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(google_id = %user.google_id, "OAuth successful, session created");

    let mut cookie = session_cookie(jwt, &state.config);
    cookie.set_max_age(time::Duration::seconds(SESSION_TTL_SECS as i64));

    Ok((
        jar.add(cookie),
        Redirect::temporary(&format!("{}/upload", frontend_url)),
    ))
}

/// Logout - expire the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let removal = session_cookie(String::new(), &state.config);
    (jar.remove(removal), StatusCode::NO_CONTENT)
}

/// Session cookie with the attributes shared by creation and removal.
fn session_cookie(value: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.is_https())
        .build()
}

fn callback_url(config: &Config) -> String {
    format!("{}/auth/google/callback", config.api_url.trim_end_matches('/'))
}

fn now_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

/// Build the OAuth state: base64("frontend_url|timestamp_hex|signature_hex").
fn sign_state(frontend_url: &str, timestamp_ms: u128, secret: &[u8]) -> Result<String> {
    let payload = format!("{}|{:x}", frontend_url, timestamp_ms);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify the state signature and age, returning the frontend URL.
fn verify_and_decode_state(state: &str, secret: &[u8], now_ms: u128) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // The URL itself may contain '|', so split from the right.
    let mut parts = state_str.rsplitn(3, '|');
    let signature_hex = parts.next()?;
    let timestamp_hex = parts.next()?;
    let frontend_url = parts.next()?;

    let payload = format!("{}|{}", frontend_url, timestamp_hex);
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_at = u128::from_str_radix(timestamp_hex, 16).ok()?;
    if now_ms.saturating_sub(issued_at) > STATE_MAX_AGE_MS {
        return None;
    }

    Some(frontend_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u128 = 1_760_000_000_000;

    #[test]
    fn test_verify_and_decode_state_success() {
        let secret = b"secret_key";
        let state = sign_state("https://example.com", NOW, secret).unwrap();

        let result = verify_and_decode_state(&state, secret, NOW + 1000);
        assert_eq!(result, Some("https://example.com".to_string()));
    }

    #[test]
    fn test_verify_and_decode_state_invalid_signature() {
        let payload = format!("{}|{:x}|{}", "https://example.com", NOW, "invalid_signature");
        let state = URL_SAFE_NO_PAD.encode(payload.as_bytes());

        assert_eq!(verify_and_decode_state(&state, b"secret_key", NOW), None);
    }

    #[test]
    fn test_verify_and_decode_state_wrong_secret() {
        let state = sign_state("https://example.com", NOW, b"secret_key").unwrap();
        assert_eq!(verify_and_decode_state(&state, b"wrong_key", NOW), None);
    }

    #[test]
    fn test_verify_and_decode_state_expired() {
        let secret = b"secret_key";
        let state = sign_state("https://example.com", NOW, secret).unwrap();
        let later = NOW + STATE_MAX_AGE_MS + 1;
        assert_eq!(verify_and_decode_state(&state, secret, later), None);
    }

    #[test]
    fn test_verify_and_decode_state_malformed() {
        let state = URL_SAFE_NO_PAD.encode("invalid|format");
        assert_eq!(verify_and_decode_state(&state, b"secret_key", NOW), None);
        assert_eq!(verify_and_decode_state("%%%", b"secret_key", NOW), None);
    }

    #[test]
    fn test_state_is_url_safe() {
        let state = sign_state("https://example.com/?a=b", NOW, b"k").unwrap();
        assert!(!state.contains('+'));
        assert!(!state.contains('/'));
        assert!(!state.contains('='));
    }
}
