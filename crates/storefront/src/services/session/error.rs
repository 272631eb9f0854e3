//! Session error types.

use thiserror::Error;

use ecofinds_core::{AccountId, DisplayNameError};

use crate::store::StoreError;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Display name failed validation.
    #[error("invalid display name: {0}")]
    InvalidDisplayName(#[from] DisplayNameError),

    /// The operation needs a signed-in account.
    #[error("not signed in")]
    NotAuthenticated,

    /// Signed in, but the account's profile is not loaded.
    #[error("profile for account {0} is not loaded")]
    ProfileNotLoaded(AccountId),

    /// The account already has a profile.
    #[error("account already exists")]
    AlreadyExists,

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
