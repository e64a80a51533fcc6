//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// User profiles with their receipts (keyed by Google ID)
    pub const USERS: &str = "users";
}
