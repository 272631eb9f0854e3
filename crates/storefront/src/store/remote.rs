//! Cart storage in the signed-in account's profile document.

use async_trait::async_trait;

use ecofinds_core::AccountId;

use super::{CartStore, ProfileStore, StoreError, WriteReceipt};
use crate::models::{CartLine, Profile, ProfilePatch, PurchaseRecord};

/// A [`CartStore`] bound to one account's profile document.
///
/// Every write is a patch of the named fields; the receipt carries the
/// whole document as stored after the patch.
pub struct RemoteStore<'a> {
    profiles: &'a dyn ProfileStore,
    account_id: &'a AccountId,
}

impl<'a> RemoteStore<'a> {
    #[must_use]
    pub const fn new(profiles: &'a dyn ProfileStore, account_id: &'a AccountId) -> Self {
        Self {
            profiles,
            account_id,
        }
    }

    async fn document(&self) -> Result<Profile, StoreError> {
        self.profiles
            .load(self.account_id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn patch(&self, patch: ProfilePatch) -> Result<WriteReceipt, StoreError> {
        let profile = self.profiles.mutate(self.account_id, patch).await?;
        Ok(WriteReceipt::from_profile(profile))
    }
}

#[async_trait]
impl CartStore for RemoteStore<'_> {
    async fn load_cart(&self) -> Result<Vec<CartLine>, StoreError> {
        Ok(self.document().await?.cart)
    }

    async fn save_cart(&self, cart: &[CartLine]) -> Result<WriteReceipt, StoreError> {
        self.patch(ProfilePatch::cart(cart.to_vec())).await
    }

    async fn load_purchases(&self) -> Result<Vec<PurchaseRecord>, StoreError> {
        Ok(self.document().await?.purchases)
    }

    async fn save_purchases(
        &self,
        purchases: &[PurchaseRecord],
    ) -> Result<WriteReceipt, StoreError> {
        self.patch(ProfilePatch::purchases(purchases.to_vec())).await
    }

    async fn load_all(&self) -> Result<(Vec<CartLine>, Vec<PurchaseRecord>), StoreError> {
        let profile = self.document().await?;
        Ok((profile.cart, profile.purchases))
    }

    async fn commit_checkout(
        &self,
        purchases: &[PurchaseRecord],
    ) -> Result<WriteReceipt, StoreError> {
        self.patch(ProfilePatch::checkout(purchases.to_vec())).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use ecofinds_core::{DisplayName, Quantity};

    use super::*;
    use crate::models::{NewCartItem, NewProfile};
    use crate::store::MemoryProfileStore;

    async fn seeded() -> (MemoryProfileStore, AccountId) {
        let store = MemoryProfileStore::new();
        let account_id = AccountId::parse("acct-1").unwrap();
        store
            .create(NewProfile {
                account_id: account_id.clone(),
                display_name: DisplayName::parse("Mira").unwrap(),
            })
            .await
            .unwrap();
        (store, account_id)
    }

    #[tokio::test]
    async fn test_save_cart_patches_document() {
        let (profiles, account_id) = seeded().await;
        let remote = RemoteStore::new(&profiles, &account_id);
        let line = NewCartItem::new("p1").into_line(Quantity::ONE).unwrap();

        let receipt = remote.save_cart(std::slice::from_ref(&line)).await.unwrap();

        let stored = profiles.load(&account_id).await.unwrap().unwrap();
        assert_eq!(stored.cart, vec![line]);
        assert_eq!(stored.updated_at, receipt.written_at);
    }

    #[tokio::test]
    async fn test_commit_checkout_clears_cart() {
        let (profiles, account_id) = seeded().await;
        let remote = RemoteStore::new(&profiles, &account_id);
        let line = NewCartItem::new("p1").into_line(Quantity::ONE).unwrap();
        remote.save_cart(std::slice::from_ref(&line)).await.unwrap();

        let record = PurchaseRecord::from_line(&line, Utc::now());
        remote
            .commit_checkout(std::slice::from_ref(&record))
            .await
            .unwrap();

        let (cart, purchases) = remote.load_all().await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(purchases, vec![record]);
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let profiles = MemoryProfileStore::new();
        let account_id = AccountId::parse("ghost").unwrap();
        let remote = RemoteStore::new(&profiles, &account_id);

        assert!(matches!(
            remote.load_cart().await,
            Err(StoreError::NotFound)
        ));
    }
}
