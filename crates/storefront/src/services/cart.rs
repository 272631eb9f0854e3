//! Cart and checkout engine.
//!
//! Every mutating operation follows the same shape:
//!
//! 1. validate input (no I/O yet)
//! 2. pick the backing store from the session: the account's profile document
//!    when signed in with a loaded profile, the local fallback store when
//!    anonymous
//! 3. take the owner's write lock, read, modify, write back
//! 4. only after a successful write, update the in-memory session
//!
//! Local and remote carts are never merged; signing in simply switches the
//! store used by subsequent calls.

use std::sync::Arc;

use chrono::Utc;
use moka::future::Cache;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument};

use ecofinds_core::{AccountId, ProductId, Quantity};

use crate::config::LockSettings;
use crate::error::{CartError, Result};
use crate::models::{CartLine, NewCartItem, PurchaseRecord, Session};
use crate::store::{CartStore, LocalFallbackStore, ProfileStore, RemoteStore, WriteReceipt};

/// Why a checkout did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckoutRejection {
    /// There was nothing to buy.
    EmptyCart,
}

impl CheckoutRejection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyCart => "empty-cart",
        }
    }
}

impl std::fmt::Display for CheckoutRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`CartEngine::checkout_cart`].
///
/// Serializes as `{"success": true, "purchases": [...]}` or
/// `{"success": false, "reason": "empty-cart"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The cart was bought; holds the newly created records in cart order.
    Completed(Vec<PurchaseRecord>),
    /// Nothing was changed.
    Rejected(CheckoutRejection),
}

impl CheckoutOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Records created by this checkout. Empty when rejected.
    #[must_use]
    pub fn purchases(&self) -> &[PurchaseRecord] {
        match self {
            Self::Completed(records) => records,
            Self::Rejected(_) => &[],
        }
    }

    #[must_use]
    pub const fn rejection(&self) -> Option<CheckoutRejection> {
        match self {
            Self::Completed(_) => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }
}

#[derive(Serialize)]
struct CheckoutResult<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<CheckoutRejection>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    purchases: &'a [PurchaseRecord],
}

impl Serialize for CheckoutOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        CheckoutResult {
            success: self.is_success(),
            reason: self.rejection(),
            purchases: self.purchases(),
        }
        .serialize(serializer)
    }
}

/// Owner of a write lock: one per account, one for the local store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LockKey {
    Local,
    Account(AccountId),
}

/// Store chosen for one call.
enum Target {
    Local,
    Remote(AccountId),
}

impl Target {
    fn lock_key(&self) -> LockKey {
        match self {
            Self::Local => LockKey::Local,
            Self::Remote(account_id) => LockKey::Account(account_id.clone()),
        }
    }
}

enum ActiveStore<'a> {
    Local(&'a LocalFallbackStore),
    Remote(RemoteStore<'a>),
}

impl ActiveStore<'_> {
    fn get(&self) -> &dyn CartStore {
        match self {
            Self::Local(local) => *local,
            Self::Remote(remote) => remote,
        }
    }
}

/// Cart and checkout operations over whichever store the session selects.
pub struct CartEngine {
    profiles: Arc<dyn ProfileStore>,
    local: LocalFallbackStore,
    locks: Cache<LockKey, Arc<Mutex<()>>>,
}

impl CartEngine {
    /// Create a new engine.
    #[must_use]
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        local: LocalFallbackStore,
        settings: LockSettings,
    ) -> Self {
        let locks = Cache::builder()
            .max_capacity(settings.max_entries)
            .time_to_idle(settings.idle)
            .build();

        Self {
            profiles,
            local,
            locks,
        }
    }

    /// Add `qty` units of `item`, merging with an existing line for the same
    /// product. A missing or non-positive `qty` adds one unit.
    ///
    /// Returns the cart as persisted.
    ///
    /// # Errors
    ///
    /// - `CartError::InvalidInput` for a blank id, a negative price or a
    ///   quantity overflow
    /// - `CartError::ProfileNotLoaded` if the session's profile is missing
    /// - `CartError::Persistence` if the store could not be read or written;
    ///   the session is left unchanged
    #[instrument(skip(self, session, item), fields(item_id = %item.id, account_id = ?session.identity()))]
    pub async fn add_to_cart(
        &self,
        session: &mut Session,
        item: NewCartItem,
        qty: Option<i64>,
    ) -> Result<Vec<CartLine>> {
        let line = item.into_line(Quantity::coerce(qty))?;
        let target = select_target(session)?;
        let _guard = self.lock(&target).await;
        let store = self.store(&target);

        let mut cart = store.get().load_cart().await?;
        merge_line(&mut cart, line)?;
        let receipt = store.get().save_cart(&cart).await?;

        debug!(lines = cart.len(), "Cart updated");
        record_cart(session, cart.clone(), receipt);
        Ok(cart)
    }

    /// Set the quantity of the line for `item_id`. A `qty` of zero or less
    /// removes the line. An unknown `item_id` changes nothing.
    ///
    /// Returns the cart as persisted (or as read, for a no-op).
    ///
    /// # Errors
    ///
    /// - `CartError::InvalidInput` for a blank id or a quantity out of range
    /// - `CartError::ProfileNotLoaded` if the session's profile is missing
    /// - `CartError::Persistence` if the store could not be read or written
    #[instrument(skip(self, session), fields(account_id = ?session.identity()))]
    pub async fn set_cart_qty(
        &self,
        session: &mut Session,
        item_id: &str,
        qty: i64,
    ) -> Result<Vec<CartLine>> {
        let id = ProductId::parse(item_id)
            .map_err(|e| CartError::InvalidInput(format!("item id: {e}")))?;
        let new_qty = if qty <= 0 {
            None
        } else {
            Some(Quantity::new(qty).map_err(|e| CartError::InvalidInput(e.to_string()))?)
        };
        let target = select_target(session)?;
        let _guard = self.lock(&target).await;
        let store = self.store(&target);

        let mut cart = store.get().load_cart().await?;
        let Some(pos) = cart.iter().position(|line| line.id == id) else {
            debug!("Item not in cart, nothing to do");
            return Ok(cart);
        };
        match new_qty {
            None => {
                cart.remove(pos);
            }
            Some(qty) => {
                if let Some(line) = cart.get_mut(pos) {
                    line.qty = qty;
                }
            }
        }
        let receipt = store.get().save_cart(&cart).await?;

        debug!(lines = cart.len(), "Cart updated");
        record_cart(session, cart.clone(), receipt);
        Ok(cart)
    }

    /// Remove the line for `item_id`. Same as `set_cart_qty(item_id, 0)`.
    ///
    /// # Errors
    ///
    /// See [`Self::set_cart_qty`].
    pub async fn remove_from_cart(
        &self,
        session: &mut Session,
        item_id: &str,
    ) -> Result<Vec<CartLine>> {
        self.set_cart_qty(session, item_id, 0).await
    }

    /// Buy everything in the cart.
    ///
    /// Each line becomes a [`PurchaseRecord`] stamped with the checkout time
    /// and appended, in cart order, to the purchase history. The cart is
    /// emptied in the same write. An empty cart yields
    /// [`CheckoutOutcome::Rejected`] and changes nothing.
    ///
    /// # Errors
    ///
    /// - `CartError::ProfileNotLoaded` if the session's profile is missing
    /// - `CartError::Persistence` if the store could not be read or written
    #[instrument(skip(self, session), fields(account_id = ?session.identity()))]
    pub async fn checkout_cart(&self, session: &mut Session) -> Result<CheckoutOutcome> {
        let target = select_target(session)?;
        let _guard = self.lock(&target).await;
        let store = self.store(&target);

        let (cart, mut purchases) = store.get().load_all().await?;
        if cart.is_empty() {
            debug!("Checkout attempted with an empty cart");
            return Ok(CheckoutOutcome::Rejected(CheckoutRejection::EmptyCart));
        }

        let bought_at = Utc::now();
        let bought: Vec<PurchaseRecord> = cart
            .iter()
            .map(|line| PurchaseRecord::from_line(line, bought_at))
            .collect();
        purchases.extend(bought.iter().cloned());
        let receipt = store.get().commit_checkout(&purchases).await?;

        match receipt.profile {
            Some(profile) => session.set_profile(Some(profile)),
            None => session.commit_checkout(purchases, receipt.written_at),
        }
        info!(records = bought.len(), "Checkout completed");
        Ok(CheckoutOutcome::Completed(bought))
    }

    /// The cart held in memory by `session`. Never performs I/O.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn get_cart<'s>(&self, session: &'s Session) -> &'s [CartLine] {
        session.cart()
    }

    /// The purchase history held in memory by `session`. Never performs I/O.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn get_purchases<'s>(&self, session: &'s Session) -> &'s [PurchaseRecord] {
        session.purchases()
    }

    async fn lock(&self, target: &Target) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .get_with(target.lock_key(), async { Arc::new(Mutex::new(())) })
            .await;
        mutex.lock_owned().await
    }

    fn store<'a>(&'a self, target: &'a Target) -> ActiveStore<'a> {
        match target {
            Target::Local => ActiveStore::Local(&self.local),
            Target::Remote(account_id) => {
                ActiveStore::Remote(RemoteStore::new(self.profiles.as_ref(), account_id))
            }
        }
    }
}

fn select_target(session: &Session) -> Result<Target> {
    match (session.identity(), session.profile()) {
        (None, _) => Ok(Target::Local),
        (Some(account_id), Some(_)) => Ok(Target::Remote(account_id.clone())),
        (Some(account_id), None) => Err(CartError::ProfileNotLoaded(account_id.clone())),
    }
}

/// Apply a committed cart write to the session. A store that returned the
/// whole document replaces the session's copy so no other field goes stale.
fn record_cart(session: &mut Session, cart: Vec<CartLine>, receipt: WriteReceipt) {
    match receipt.profile {
        Some(profile) => session.set_profile(Some(profile)),
        None => session.commit_cart(cart, receipt.written_at),
    }
}

fn merge_line(cart: &mut Vec<CartLine>, line: CartLine) -> Result<()> {
    if let Some(existing) = cart.iter_mut().find(|l| l.id == line.id) {
        existing.qty = existing
            .qty
            .checked_add(line.qty)
            .map_err(|e| CartError::InvalidInput(e.to_string()))?;
    } else {
        cart.push(line);
    }
    Ok(())
}
