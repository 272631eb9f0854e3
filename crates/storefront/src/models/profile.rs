//! Per-account profile documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecofinds_core::{AccountId, DisplayName};

use super::cart::{CartLine, PurchaseRecord};

/// Durable per-account state: the cart and the purchase history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub account_id: AccountId,
    pub display_name: DisplayName,
    pub cart: Vec<CartLine>,
    pub purchases: Vec<PurchaseRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data needed to create a profile at signup.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub account_id: AccountId,
    pub display_name: DisplayName,
}

impl NewProfile {
    /// Build the initial document: empty cart and purchases, both timestamps
    /// set to `now`.
    #[must_use]
    pub fn into_profile(self, now: DateTime<Utc>) -> Profile {
        Profile {
            account_id: self.account_id,
            display_name: self.display_name,
            cart: Vec::new(),
            purchases: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields to merge into a stored profile. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub display_name: Option<DisplayName>,
    pub cart: Option<Vec<CartLine>>,
    pub purchases: Option<Vec<PurchaseRecord>>,
}

impl ProfilePatch {
    #[must_use]
    pub fn cart(cart: Vec<CartLine>) -> Self {
        Self {
            cart: Some(cart),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn purchases(purchases: Vec<PurchaseRecord>) -> Self {
        Self {
            purchases: Some(purchases),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn display_name(display_name: DisplayName) -> Self {
        Self {
            display_name: Some(display_name),
            ..Self::default()
        }
    }

    /// Empty the cart and replace the purchase history in one patch.
    #[must_use]
    pub fn checkout(purchases: Vec<PurchaseRecord>) -> Self {
        Self {
            display_name: None,
            cart: Some(Vec::new()),
            purchases: Some(purchases),
        }
    }

    /// Merge the patch into `profile` and stamp `updated_at`.
    pub fn apply(self, profile: &mut Profile, now: DateTime<Utc>) {
        if let Some(display_name) = self.display_name {
            profile.display_name = display_name;
        }
        if let Some(cart) = self.cart {
            profile.cart = cart;
        }
        if let Some(purchases) = self.purchases {
            profile.purchases = purchases;
        }
        profile.updated_at = now;
    }
}
