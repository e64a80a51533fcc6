// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Everything lives in the `users` collection: one document per Google
//! account holding the profile and the receipts uploaded by that user.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{LoginProfile, Receipt, User};
use firestore::{FirestoreConsistencySelector, FirestoreTransaction};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    /// Process-local documents, for tests that need a working store.
    Memory(Arc<Mutex<HashMap<String, User>>>),
    Offline,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    /// Create an in-memory store for testing.
    ///
    /// Documents live for as long as any clone of the handle.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(Mutex::new(HashMap::new()))),
        }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        match &self.backend {
            Backend::Firestore(client) => Ok(client),
            _ => Err(AppError::Database(
                "Database not connected (offline mode)".to_string(),
            )),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by Google ID.
    pub async fn get_user(&self, google_id: &str) -> Result<Option<User>, AppError> {
        if let Backend::Memory(users) = &self.backend {
            return Ok(users.lock().await.get(google_id).cloned());
        }

        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(google_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or overwrite a user document.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        if let Backend::Memory(users) = &self.backend {
            users
                .lock()
                .await
                .insert(user.google_id.clone(), user.clone());
            return Ok(());
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.google_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Record a sign-in: refresh the profile, keeping `created_at` and receipts.
    ///
    /// Runs as a read-modify-write in one transaction so a concurrent upload
    /// is never overwritten by the profile update.
    pub async fn record_login(&self, profile: LoginProfile) -> Result<User, AppError> {
        let now = chrono::Utc::now().to_rfc3339();
        let google_id = profile.google_id.clone();
        let mut is_new = false;

        let user = self
            .modify_user(&google_id, |existing| {
                is_new = existing.is_none();
                Ok(User::from_login(existing, profile, &now))
            })
            .await?;

        tracing::info!(google_id = %user.google_id, is_new, "Recorded login");
        Ok(user)
    }

    // ─── Receipt Operations ──────────────────────────────────────

    /// List a user's receipts in upload order.
    pub async fn get_receipts(&self, google_id: &str) -> Result<Vec<Receipt>, AppError> {
        let user = self
            .get_user(google_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", google_id)))?;
        Ok(user.files)
    }

    /// Append a receipt to the user's document.
    ///
    /// The read and write share a transaction so concurrent uploads from the
    /// same user cannot drop each other's receipts.
    pub async fn append_receipt(&self, google_id: &str, receipt: &Receipt) -> Result<(), AppError> {
        let user = self
            .modify_user(google_id, |existing| {
                let mut user = existing
                    .ok_or_else(|| AppError::NotFound(format!("User {} not found", google_id)))?;
                user.files.push(receipt.clone());
                Ok(user)
            })
            .await?;

        tracing::info!(
            google_id,
            file_name = %receipt.file_name,
            receipt_count = user.files.len(),
            "Receipt appended"
        );

        Ok(())
    }

    /// Transactional read-modify-write of one user document.
    ///
    /// The read is bound to the transaction, so Firestore rejects the commit
    /// if another writer touched the document in between.
    async fn modify_user<F>(&self, google_id: &str, update: F) -> Result<User, AppError>
    where
        F: FnOnce(Option<User>) -> Result<User, AppError>,
    {
        if let Backend::Memory(users) = &self.backend {
            let mut users = users.lock().await;
            let user = update(users.get(google_id).cloned())?;
            users.insert(google_id.to_string(), user.clone());
            return Ok(user);
        }

        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let current = match read_user_in_transaction(client, &transaction, google_id).await {
            Ok(current) => current,
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(e);
            }
        };

        let user = match update(current) {
            Ok(user) => user,
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(e);
            }
        };

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(google_id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(user)
    }
}

async fn read_user_in_transaction(
    client: &firestore::FirestoreDb,
    transaction: &FirestoreTransaction<'_>,
    google_id: &str,
) -> Result<Option<User>, AppError> {
    client
        .clone_with_consistency_selector(FirestoreConsistencySelector::Transaction(
            transaction.transaction_id().clone(),
        ))
        .fluent()
        .select()
        .by_id_in(collections::USERS)
        .obj()
        .one(google_id)
        .await
        .map_err(|e| AppError::Database(format!("Failed to read user in transaction: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReceiptItem;

    fn profile(google_id: &str, name: &str) -> LoginProfile {
        LoginProfile {
            google_id: google_id.to_string(),
            display_name: name.to_string(),
            email: None,
            photo_url: None,
        }
    }

    fn receipt(file_name: &str) -> Receipt {
        Receipt::new(
            file_name.to_string(),
            String::new(),
            vec![ReceiptItem {
                name: "Milk".to_string(),
                price: 3.49,
                category: "Dairy".to_string(),
            }],
            0.0,
            String::new(),
        )
    }

    #[tokio::test]
    async fn test_in_memory_login_keeps_receipts() {
        let db = FirestoreDb::new_in_memory();
        let first = db.record_login(profile("u1", "Before")).await.unwrap();
        db.append_receipt("u1", &receipt("one.jpg")).await.unwrap();

        let again = db.record_login(profile("u1", "After")).await.unwrap();

        assert_eq!(again.display_name, "After");
        assert_eq!(again.created_at, first.created_at);
        assert_eq!(again.files.len(), 1);
        assert_eq!(db.get_receipts("u1").await.unwrap()[0].file_name, "one.jpg");
    }

    #[tokio::test]
    async fn test_in_memory_append_requires_user() {
        let db = FirestoreDb::new_in_memory();
        let result = db.append_receipt("ghost", &receipt("x.jpg")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(db.get_user("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_concurrent_appends_all_land() {
        let db = FirestoreDb::new_in_memory();
        db.record_login(profile("u1", "Racer")).await.unwrap();

        let (a, b) = (receipt("a.jpg"), receipt("b.jpg"));
        let (ra, rb) = tokio::join!(db.append_receipt("u1", &a), db.append_receipt("u1", &b));
        ra.unwrap();
        rb.unwrap();

        assert_eq!(db.get_receipts("u1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_offline_mode_reports_database_error() {
        let db = FirestoreDb::new_mock();
        assert!(matches!(db.get_user("u1").await, Err(AppError::Database(_))));
    }
}
