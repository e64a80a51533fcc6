// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (FIRESTORE_EMULATOR_HOST set). They are skipped otherwise.

use smartcards_api::error::AppError;
use smartcards_api::models::{LoginProfile, Receipt, ReceiptItem};

mod common;
use common::{test_db, unique_google_id};

fn profile(google_id: &str, name: &str) -> LoginProfile {
    LoginProfile {
        google_id: google_id.to_string(),
        display_name: name.to_string(),
        email: Some("test@example.com".to_string()),
        photo_url: Some("https://example.com/pic.jpg".to_string()),
    }
}

fn test_receipt(file_name: &str) -> Receipt {
    Receipt::new(
        file_name.to_string(),
        format!("receipts/test/{}", file_name),
        vec![
            ReceiptItem {
                name: "Milk".to_string(),
                price: 3.49,
                category: "Groceries".to_string(),
            },
            ReceiptItem {
                name: "Paper Towels".to_string(),
                price: 7.99,
                category: "Household".to_string(),
            },
        ],
        0.92,
        chrono::Utc::now().to_rfc3339(),
    )
}

#[tokio::test]
async fn test_first_login_creates_user() {
    require_emulator!();

    let db = test_db().await;
    let google_id = unique_google_id();

    assert!(db.get_user(&google_id).await.unwrap().is_none());

    let user = db.record_login(profile(&google_id, "Test User")).await.unwrap();
    assert_eq!(user.created_at, user.last_login);

    let fetched = db.get_user(&google_id).await.unwrap().unwrap();
    assert_eq!(fetched.display_name, "Test User");
    assert_eq!(fetched.email.as_deref(), Some("test@example.com"));
    assert!(fetched.files.is_empty());
}

#[tokio::test]
async fn test_receipts_append_in_order_and_survive_login() {
    require_emulator!();

    let db = test_db().await;
    let google_id = unique_google_id();

    let first = db.record_login(profile(&google_id, "Before")).await.unwrap();

    db.append_receipt(&google_id, &test_receipt("one.jpg"))
        .await
        .unwrap();
    db.append_receipt(&google_id, &test_receipt("two.jpg"))
        .await
        .unwrap();

    let again = db.record_login(profile(&google_id, "After")).await.unwrap();
    assert_eq!(again.display_name, "After");
    assert_eq!(again.created_at, first.created_at);

    let files = db.get_receipts(&google_id).await.unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].file_name, "one.jpg");
    assert_eq!(files[1].file_name, "two.jpg");
    assert_eq!(files[0].total, 12.40);
}

#[tokio::test]
async fn test_append_receipt_unknown_user_is_not_found() {
    require_emulator!();

    let db = test_db().await;
    let result = db
        .append_receipt(&unique_google_id(), &test_receipt("x.jpg"))
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_get_receipts_unknown_user_is_not_found() {
    require_emulator!();

    let db = test_db().await;
    let result = db.get_receipts(&unique_google_id()).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_concurrent_appends_never_lose_a_committed_receipt() {
    require_emulator!();

    let db = test_db().await;
    let google_id = unique_google_id();
    db.record_login(profile(&google_id, "Racer")).await.unwrap();

    let first = test_receipt("a.jpg");
    let second = test_receipt("b.jpg");
    let (a, b, login) = tokio::join!(
        db.append_receipt(&google_id, &first),
        db.append_receipt(&google_id, &second),
        db.record_login(profile(&google_id, "Racer Again")),
    );

    // A contended transaction may be aborted, but every append that
    // reported success must be in the document.
    let committed: Vec<&str> = [(&a, "a.jpg"), (&b, "b.jpg")]
        .into_iter()
        .filter(|(result, _)| result.is_ok())
        .map(|(_, name)| name)
        .collect();

    let files = db.get_receipts(&google_id).await.unwrap();
    let stored: Vec<&str> = files.iter().map(|r| r.file_name.as_str()).collect();
    for name in &committed {
        assert!(stored.contains(name), "{} committed but missing", name);
    }
    assert_eq!(stored.len(), committed.len());

    if login.is_ok() {
        let user = db.get_user(&google_id).await.unwrap().unwrap();
        assert_eq!(user.files.len(), committed.len());
    }
}
