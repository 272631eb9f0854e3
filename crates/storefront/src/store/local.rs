//! Local fallback store for anonymous sessions.
//!
//! The cart and purchase history are kept as JSON arrays in two fixed
//! key-value slots. This store is best effort: anything that cannot be read
//! or decoded is treated as empty and logged, never returned as an error.
//! Writes still report failure so the engine does not commit to the session
//! a cart that was never stored.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::warn;

use super::{CartStore, SlotStore, StoreError, WriteReceipt};
use crate::models::{CartLine, LocalSnapshot, PurchaseRecord};

/// Slot keys of the local fallback store.
pub mod keys {
    /// Key of the JSON-encoded cart.
    pub const CART: &str = "eco_demo_cart";

    /// Key of the JSON-encoded purchase history.
    pub const PURCHASES: &str = "eco_demo_purchases";
}

/// Cart and purchases kept in a [`SlotStore`].
///
/// Cheaply cloneable; clones share the same slots.
#[derive(Clone)]
pub struct LocalFallbackStore {
    slots: Arc<dyn SlotStore>,
}

impl LocalFallbackStore {
    #[must_use]
    pub fn new(slots: Arc<dyn SlotStore>) -> Self {
        Self { slots }
    }

    /// Read both slots into an in-memory snapshot.
    pub async fn snapshot(&self) -> LocalSnapshot {
        LocalSnapshot {
            cart: self.read_sequence(keys::CART).await,
            purchases: self.read_sequence(keys::PURCHASES).await,
        }
    }

    async fn read_sequence<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.slots.read(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key, error = %e, "Local slot unreadable, treating as empty");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key, error = %e, "Local slot holds invalid JSON, treating as empty");
            Vec::new()
        })
    }

    /// Put back the purchases slot as it was before a failed checkout, so a
    /// retry does not record the same lines twice.
    async fn restore_purchases(&self, previous: Result<Option<String>, StoreError>) {
        let raw = match previous {
            Ok(raw) => raw.unwrap_or_else(|| "[]".to_owned()),
            Err(e) => {
                warn!(error = %e, "Purchases were unreadable before checkout, not rolling back");
                return;
            }
        };
        if let Err(e) = self.slots.write(keys::PURCHASES, &raw).await {
            warn!(error = %e, "Could not roll back purchases after a failed checkout");
        }
    }

    async fn write_sequence<T: Serialize + Sync>(
        &self,
        key: &str,
        items: &[T],
    ) -> Result<WriteReceipt, StoreError> {
        let encoded = serde_json::to_string(items)?;
        self.slots.write(key, &encoded).await?;
        Ok(WriteReceipt::now())
    }
}

#[async_trait]
impl CartStore for LocalFallbackStore {
    async fn load_cart(&self) -> Result<Vec<CartLine>, StoreError> {
        Ok(self.read_sequence(keys::CART).await)
    }

    async fn save_cart(&self, cart: &[CartLine]) -> Result<WriteReceipt, StoreError> {
        self.write_sequence(keys::CART, cart).await
    }

    async fn load_purchases(&self) -> Result<Vec<PurchaseRecord>, StoreError> {
        Ok(self.read_sequence(keys::PURCHASES).await)
    }

    async fn save_purchases(
        &self,
        purchases: &[PurchaseRecord],
    ) -> Result<WriteReceipt, StoreError> {
        self.write_sequence(keys::PURCHASES, purchases).await
    }

    async fn commit_checkout(
        &self,
        purchases: &[PurchaseRecord],
    ) -> Result<WriteReceipt, StoreError> {
        // Purchases first: a crash in between leaves the cart intact rather
        // than losing the lines.
        let previous = self.slots.read(keys::PURCHASES).await;
        self.save_purchases(purchases).await?;
        match self.save_cart(&[]).await {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                self.restore_purchases(previous).await;
                Err(e)
            }
        }
    }
}

// =============================================================================
// Slot backends
// =============================================================================

/// Slots stored as one file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileSlots {
    dir: PathBuf,
}

impl FileSlots {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl SlotStore for FileSlots {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(self.path(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

/// Slots held in memory.
#[derive(Debug, Default)]
pub struct MemorySlots {
    values: RwLock<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemorySlots {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SlotStore for MemorySlots {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other(
                "slot store is rejecting writes",
            )));
        }
        self.values
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use ecofinds_core::Quantity;

    use super::*;
    use crate::models::NewCartItem;

    fn store() -> (Arc<MemorySlots>, LocalFallbackStore) {
        let slots = Arc::new(MemorySlots::new());
        let local = LocalFallbackStore::new(slots.clone());
        (slots, local)
    }

    #[tokio::test]
    async fn test_missing_slots_read_empty() {
        let (_, local) = store();
        assert!(local.load_cart().await.unwrap().is_empty());
        assert!(local.load_purchases().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupted_cart_reads_empty() {
        let (slots, local) = store();
        slots.write(keys::CART, "{not json").await.unwrap();
        assert!(local.load_cart().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_shape_reads_empty() {
        let (slots, local) = store();
        slots.write(keys::PURCHASES, r#"{"a":1}"#).await.unwrap();
        assert!(local.load_purchases().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_cart() {
        let (_, local) = store();
        let line = NewCartItem::new("p1").into_line(Quantity::ONE).unwrap();

        local.save_cart(std::slice::from_ref(&line)).await.unwrap();

        assert_eq!(local.load_cart().await.unwrap(), vec![line]);
    }

    #[tokio::test]
    async fn test_commit_checkout_writes_both_slots() {
        let (_, local) = store();
        let line = NewCartItem::new("p1").into_line(Quantity::ONE).unwrap();
        local.save_cart(std::slice::from_ref(&line)).await.unwrap();
        let record = PurchaseRecord::from_line(&line, Utc::now());

        local
            .commit_checkout(std::slice::from_ref(&record))
            .await
            .unwrap();

        let snapshot = local.snapshot().await;
        assert!(snapshot.cart.is_empty());
        assert_eq!(snapshot.purchases, vec![record]);
    }

    /// Slots that reject writes to the cart key only.
    #[derive(Default)]
    struct CartWritesDown {
        inner: MemorySlots,
        down: AtomicBool,
    }

    #[async_trait]
    impl SlotStore for CartWritesDown {
        async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.read(key).await
        }

        async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if key == keys::CART && self.down.load(Ordering::SeqCst) {
                return Err(StoreError::Io(std::io::Error::other("cart slot down")));
            }
            self.inner.write(key, value).await
        }
    }

    #[tokio::test]
    async fn test_failed_checkout_leaves_purchases_untouched() {
        let slots = Arc::new(CartWritesDown::default());
        let local = LocalFallbackStore::new(slots.clone());
        let line = NewCartItem::new("p1").into_line(Quantity::ONE).unwrap();
        let earlier = PurchaseRecord::from_line(&line, Utc::now());
        local.save_purchases(std::slice::from_ref(&earlier)).await.unwrap();
        local.save_cart(std::slice::from_ref(&line)).await.unwrap();
        slots.down.store(true, Ordering::SeqCst);

        let extended = vec![earlier.clone(), PurchaseRecord::from_line(&line, Utc::now())];
        assert!(local.commit_checkout(&extended).await.is_err());

        let snapshot = local.snapshot().await;
        assert_eq!(snapshot.cart, vec![line]);
        assert_eq!(snapshot.purchases, vec![earlier]);
    }

    #[tokio::test]
    async fn test_failed_first_checkout_leaves_no_purchases() {
        let slots = Arc::new(CartWritesDown::default());
        let local = LocalFallbackStore::new(slots.clone());
        let line = NewCartItem::new("p1").into_line(Quantity::ONE).unwrap();
        local.save_cart(std::slice::from_ref(&line)).await.unwrap();
        slots.down.store(true, Ordering::SeqCst);

        let record = PurchaseRecord::from_line(&line, Utc::now());
        assert!(local.commit_checkout(&[record]).await.is_err());

        assert!(local.load_purchases().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_is_reported() {
        let (slots, local) = store();
        slots.fail_writes(true);
        assert!(local.save_cart(&[]).await.is_err());
    }

    #[tokio::test]
    async fn test_file_slots_round_trip() {
        let dir = std::env::temp_dir().join(format!("ecofinds-slots-{}", uuid::Uuid::new_v4()));
        let slots = FileSlots::new(&dir);

        assert!(slots.read(keys::CART).await.unwrap().is_none());
        slots.write(keys::CART, "[]").await.unwrap();
        assert_eq!(slots.read(keys::CART).await.unwrap().as_deref(), Some("[]"));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
