//! Cart engine error type.
//!
//! Checking out an empty cart is not an error; it is reported through
//! [`crate::services::cart::CheckoutOutcome`].

use thiserror::Error;

use ecofinds_core::AccountId;

use crate::store::StoreError;

/// Errors returned by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Missing or malformed item id, price or quantity. Raised before any I/O.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The backing store could not be read or written. Nothing was committed
    /// to the session; the whole operation may be retried.
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),

    /// The session is authenticated but its profile has not been loaded.
    #[error("profile for account {0} is not loaded")]
    ProfileNotLoaded(AccountId),
}

impl CartError {
    /// Whether the caller may retry the same operation unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::InvalidInput("item id: id cannot be blank".to_string());
        assert_eq!(err.to_string(), "invalid input: item id: id cannot be blank");

        let err = CartError::Persistence(StoreError::NotFound);
        assert_eq!(err.to_string(), "persistence failure: not found");
    }

    #[test]
    fn test_only_persistence_is_retryable() {
        assert!(CartError::Persistence(StoreError::NotFound).is_retryable());
        assert!(!CartError::InvalidInput(String::new()).is_retryable());
    }
}
