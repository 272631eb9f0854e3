//! Where carts and purchase histories are durably kept.
//!
//! Two backends exist:
//!
//! - the **remote profile store** ([`ProfileStore`]): one document per
//!   account, mutated by read-modify-write. Implemented by
//!   [`crate::db::PgProfileStore`] and [`MemoryProfileStore`].
//! - the **local fallback store** ([`LocalFallbackStore`]): two fixed
//!   key-value slots used while nobody is signed in, over any [`SlotStore`]
//!   ([`FileSlots`], [`MemorySlots`]).
//!
//! The cart engine never talks to either directly. It picks one
//! [`CartStore`] per call: [`RemoteStore`] bound to the signed-in account, or
//! the local fallback store.

pub mod local;
pub mod memory;
pub mod remote;

pub use local::{FileSlots, LocalFallbackStore, MemorySlots, keys};
pub use memory::MemoryProfileStore;
pub use remote::RemoteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use thiserror::Error;

use ecofinds_core::AccountId;

use crate::models::{CartLine, NewProfile, Profile, ProfilePatch, PurchaseRecord};

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem error from a slot store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be encoded for storage.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored data is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested document was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., a profile already exists).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Remote per-account profile documents.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Create the profile document for a new account.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the account already has a profile.
    async fn create(&self, profile: NewProfile) -> Result<Profile, StoreError>;

    /// Load the profile document, normalizing missing `cart`/`purchases` to
    /// empty sequences.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DataCorruption` if the stored document is invalid.
    async fn load(&self, account_id: &AccountId) -> Result<Option<Profile>, StoreError>;

    /// Merge `patch` into the stored document, stamp `updatedAt`, and return
    /// the updated profile.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account has no profile.
    async fn mutate(
        &self,
        account_id: &AccountId,
        patch: ProfilePatch,
    ) -> Result<Profile, StoreError>;
}

/// Durable string slots addressed by fixed keys.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Read a slot. A missing slot is `Ok(None)`.
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite a slot.
    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Acknowledgement of a committed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    /// When the backing store recorded the write.
    pub written_at: DateTime<Utc>,
    /// The whole document after the write, for stores that return one.
    pub profile: Option<Profile>,
}

impl WriteReceipt {
    /// Receipt for a store that keeps no document, stamped now.
    #[must_use]
    pub fn now() -> Self {
        Self {
            written_at: Utc::now(),
            profile: None,
        }
    }

    /// Receipt carrying the profile document as it was written.
    #[must_use]
    pub fn from_profile(profile: Profile) -> Self {
        Self {
            written_at: profile.updated_at,
            profile: Some(profile),
        }
    }
}

/// The capability the cart engine needs from a backing store.
///
/// Both backends implement the same contract so the engine chooses a store
/// once per call and never branches on the backend afterwards.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Current cart.
    async fn load_cart(&self) -> Result<Vec<CartLine>, StoreError>;

    /// Replace the cart.
    async fn save_cart(&self, cart: &[CartLine]) -> Result<WriteReceipt, StoreError>;

    /// Current purchase history.
    async fn load_purchases(&self) -> Result<Vec<PurchaseRecord>, StoreError>;

    /// Replace the purchase history.
    async fn save_purchases(
        &self,
        purchases: &[PurchaseRecord],
    ) -> Result<WriteReceipt, StoreError>;

    /// Cart and purchase history together.
    async fn load_all(&self) -> Result<(Vec<CartLine>, Vec<PurchaseRecord>), StoreError> {
        let cart = self.load_cart().await?;
        let purchases = self.load_purchases().await?;
        Ok((cart, purchases))
    }

    /// Empty the cart and replace the purchase history in one persistence
    /// call.
    async fn commit_checkout(
        &self,
        purchases: &[PurchaseRecord],
    ) -> Result<WriteReceipt, StoreError>;
}

/// Decode a stored sequence, treating a missing or non-array value as empty.
///
/// # Errors
///
/// Returns a `serde_json::Error` if the value is an array whose elements do
/// not decode.
pub(crate) fn normalize_sequence<T: DeserializeOwned>(
    value: Option<serde_json::Value>,
) -> Result<Vec<T>, serde_json::Error> {
    match value {
        Some(array @ serde_json::Value::Array(_)) => serde_json::from_value(array),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_normalize_sequence_missing_and_null() {
        assert!(normalize_sequence::<CartLine>(None).unwrap().is_empty());
        assert!(
            normalize_sequence::<CartLine>(Some(serde_json::Value::Null))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_normalize_sequence_non_array() {
        let lines: Vec<CartLine> = normalize_sequence(Some(json!({"p1": 2}))).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_normalize_sequence_decodes_array() {
        let lines: Vec<CartLine> =
            normalize_sequence(Some(json!([{"id": "p1", "qty": 2}]))).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].qty.get(), 2);
    }

    #[test]
    fn test_normalize_sequence_rejects_bad_elements() {
        assert!(normalize_sequence::<CartLine>(Some(json!([{"qty": 0}]))).is_err());
    }

    #[test]
    fn test_stores_are_object_safe() {
        fn _profiles(_store: &dyn ProfileStore) {}
        fn _slots(_store: &dyn SlotStore) {}
        fn _carts(_store: &dyn CartStore) {}
    }
}
