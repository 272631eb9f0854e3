//! In-memory profile document store.
//!
//! Keeps each profile as a raw JSON document so the read path goes through
//! the same normalization as documents written by older clients. Used by the
//! test suites and by the CLI when no database is configured.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;

use ecofinds_core::{AccountId, DisplayName};

use super::{ProfileStore, StoreError, normalize_sequence};
use crate::models::{CartLine, NewProfile, Profile, ProfilePatch, PurchaseRecord};

/// Profile documents held in memory.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    documents: RwLock<HashMap<AccountId, serde_json::Value>>,
    fail_writes: AtomicBool,
}

/// Stored document shape. `cart`/`purchases` may be absent or not arrays.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileDocument {
    #[serde(alias = "username")]
    display_name: DisplayName,
    #[serde(default)]
    cart: Option<serde_json::Value>,
    #[serde(default)]
    purchases: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MemoryProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw document, replacing any existing one.
    pub async fn insert_document(&self, account_id: AccountId, document: serde_json::Value) {
        self.documents.write().await.insert(account_id, document);
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other(
                "profile store is rejecting writes",
            )));
        }
        Ok(())
    }
}

fn decode(account_id: &AccountId, document: &serde_json::Value) -> Result<Profile, StoreError> {
    let doc = ProfileDocument::deserialize(document).map_err(|e| {
        StoreError::DataCorruption(format!("invalid profile document for {account_id}: {e}"))
    })?;
    let cart: Vec<CartLine> = normalize_sequence(doc.cart)
        .map_err(|e| StoreError::DataCorruption(format!("invalid cart for {account_id}: {e}")))?;
    let purchases: Vec<PurchaseRecord> = normalize_sequence(doc.purchases).map_err(|e| {
        StoreError::DataCorruption(format!("invalid purchases for {account_id}: {e}"))
    })?;

    Ok(Profile {
        account_id: account_id.clone(),
        display_name: doc.display_name,
        cart,
        purchases,
        created_at: doc.created_at,
        updated_at: doc.updated_at,
    })
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn create(&self, new_profile: NewProfile) -> Result<Profile, StoreError> {
        self.check_writable()?;
        let mut documents = self.documents.write().await;
        if documents.contains_key(&new_profile.account_id) {
            return Err(StoreError::Conflict("profile already exists".to_owned()));
        }
        let profile = new_profile.into_profile(Utc::now());
        documents.insert(profile.account_id.clone(), serde_json::to_value(&profile)?);
        Ok(profile)
    }

    async fn load(&self, account_id: &AccountId) -> Result<Option<Profile>, StoreError> {
        let documents = self.documents.read().await;
        documents
            .get(account_id)
            .map(|doc| decode(account_id, doc))
            .transpose()
    }

    async fn mutate(
        &self,
        account_id: &AccountId,
        patch: ProfilePatch,
    ) -> Result<Profile, StoreError> {
        self.check_writable()?;
        let mut documents = self.documents.write().await;
        let document = documents.get(account_id).ok_or(StoreError::NotFound)?;
        let mut profile = decode(account_id, document)?;
        patch.apply(&mut profile, Utc::now());
        documents.insert(account_id.clone(), serde_json::to_value(&profile)?);
        Ok(profile)
    }
}
