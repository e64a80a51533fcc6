//! User model for storage and API.

use serde::{Deserialize, Serialize};

use crate::models::Receipt;

/// User profile stored in Firestore.
///
/// The document also holds the user's uploaded receipts, appended in
/// upload order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Google account ID (also used as document ID)
    pub google_id: String,
    /// Display name from the Google profile
    pub display_name: String,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
    /// Profile picture URL
    pub photo_url: Option<String>,
    /// When user first signed in
    pub created_at: String,
    /// Most recent sign-in
    pub last_login: String,
    /// Uploaded receipts
    #[serde(default)]
    pub files: Vec<Receipt>,
}

/// Profile fields refreshed from Google on every sign-in.
#[derive(Debug, Clone)]
pub struct LoginProfile {
    pub google_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

impl User {
    /// Apply a sign-in to an existing (or missing) profile.
    ///
    /// `created_at` and `files` survive; everything else is refreshed.
    pub fn from_login(existing: Option<User>, profile: LoginProfile, now: &str) -> Self {
        match existing {
            Some(user) => User {
                google_id: profile.google_id,
                display_name: profile.display_name,
                email: profile.email,
                photo_url: profile.photo_url,
                created_at: user.created_at,
                last_login: now.to_string(),
                files: user.files,
            },
            None => User {
                google_id: profile.google_id,
                display_name: profile.display_name,
                email: profile.email,
                photo_url: profile.photo_url,
                created_at: now.to_string(),
                last_login: now.to_string(),
                files: Vec::new(),
            },
        }
    }
}
