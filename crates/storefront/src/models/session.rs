//! Session state handed to the cart engine.
//!
//! A session is either anonymous, in which case the cart lives in the local
//! fallback store, or authenticated, in which case it lives in the account's
//! profile document. The value is owned by the caller and passed into every
//! engine operation; there is no ambient session.

use chrono::{DateTime, Utc};

use ecofinds_core::AccountId;

use super::cart::{CartLine, PurchaseRecord};
use super::profile::Profile;

/// In-memory copy of the local fallback store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalSnapshot {
    pub cart: Vec<CartLine>,
    pub purchases: Vec<PurchaseRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionState {
    Anonymous(LocalSnapshot),
    Authenticated {
        identity: AccountId,
        profile: Option<Profile>,
    },
}

/// Current identity plus the loaded profile, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    state: SessionState,
}

impl Session {
    /// An anonymous session over the given local snapshot.
    #[must_use]
    pub const fn anonymous(local: LocalSnapshot) -> Self {
        Self {
            state: SessionState::Anonymous(local),
        }
    }

    /// An authenticated session. `profile` is `None` while it is still
    /// loading or when the account has no profile document.
    ///
    /// A profile belonging to a different account is discarded.
    #[must_use]
    pub fn authenticated(identity: AccountId, profile: Option<Profile>) -> Self {
        let profile = profile.filter(|p| p.account_id == identity);
        Self {
            state: SessionState::Authenticated { identity, profile },
        }
    }

    /// The authenticated account, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&AccountId> {
        match &self.state {
            SessionState::Anonymous(_) => None,
            SessionState::Authenticated { identity, .. } => Some(identity),
        }
    }

    /// The loaded profile, if any.
    #[must_use]
    pub const fn profile(&self) -> Option<&Profile> {
        match &self.state {
            SessionState::Anonymous(_) => None,
            SessionState::Authenticated { profile, .. } => profile.as_ref(),
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    /// The cart as currently held in memory. Empty when nothing is loaded.
    #[must_use]
    pub fn cart(&self) -> &[CartLine] {
        match &self.state {
            SessionState::Anonymous(local) => &local.cart,
            SessionState::Authenticated { profile, .. } => match profile {
                Some(p) => &p.cart,
                None => &[],
            },
        }
    }

    /// The purchase history as currently held in memory.
    #[must_use]
    pub fn purchases(&self) -> &[PurchaseRecord] {
        match &self.state {
            SessionState::Anonymous(local) => &local.purchases,
            SessionState::Authenticated { profile, .. } => match profile {
                Some(p) => &p.purchases,
                None => &[],
            },
        }
    }

    /// Replace the loaded profile. Ignored for anonymous sessions and for
    /// profiles of another account.
    pub(crate) fn set_profile(&mut self, loaded: Option<Profile>) {
        if let SessionState::Authenticated { identity, profile } = &mut self.state {
            *profile = loaded.filter(|p| &p.account_id == identity);
        }
    }

    /// Record a committed cart write.
    pub(crate) fn commit_cart(&mut self, cart: Vec<CartLine>, written_at: DateTime<Utc>) {
        match &mut self.state {
            SessionState::Anonymous(local) => local.cart = cart,
            SessionState::Authenticated { profile, .. } => {
                if let Some(p) = profile {
                    p.cart = cart;
                    p.updated_at = written_at;
                }
            }
        }
    }

    /// Record a committed checkout: empty cart, extended purchases.
    pub(crate) fn commit_checkout(
        &mut self,
        purchases: Vec<PurchaseRecord>,
        written_at: DateTime<Utc>,
    ) {
        match &mut self.state {
            SessionState::Anonymous(local) => {
                local.cart.clear();
                local.purchases = purchases;
            }
            SessionState::Authenticated { profile, .. } => {
                if let Some(p) = profile {
                    p.cart.clear();
                    p.purchases = purchases;
                    p.updated_at = written_at;
                }
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous(LocalSnapshot::default())
    }
}
