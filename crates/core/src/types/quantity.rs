//! Cart line quantities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative quantity.
    #[error("quantity must be at least 1 (got {0})")]
    NotPositive(i64),
    /// Quantity does not fit the supported range.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Maximum allowed quantity.
        max: u32,
    },
}

/// A positive number of units on a cart line or purchase record.
///
/// A line with zero units is never represented; callers remove the line
/// instead.
///
/// ```
/// use ecofinds_core::Quantity;
///
/// assert_eq!(Quantity::coerce(None).get(), 1);
/// assert_eq!(Quantity::coerce(Some(-3)).get(), 1);
/// assert_eq!(Quantity::coerce(Some(4)).get(), 4);
/// assert!(Quantity::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(1);

    /// Create a quantity from a signed integer.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::NotPositive` for values below 1 and
    /// `QuantityError::TooLarge` for values above `u32::MAX`.
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::NotPositive(value));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| QuantityError::TooLarge { max: u32::MAX })
    }

    /// Coerce a requested amount, falling back to one unit when the request
    /// is missing or not positive.
    #[must_use]
    pub fn coerce(requested: Option<i64>) -> Self {
        requested.and_then(|v| Self::new(v).ok()).unwrap_or(Self::ONE)
    }

    /// The number of units.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Add units to this quantity.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::TooLarge` if the sum overflows.
    pub fn checked_add(self, other: Self) -> Result<Self, QuantityError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(QuantityError::TooLarge { max: u32::MAX })
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(qty: Quantity) -> Self {
        qty.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_and_negative() {
        assert_eq!(Quantity::new(0), Err(QuantityError::NotPositive(0)));
        assert_eq!(Quantity::new(-2), Err(QuantityError::NotPositive(-2)));
    }

    #[test]
    fn test_new_rejects_overflow() {
        let too_big = i64::from(u32::MAX) + 1;
        assert!(matches!(
            Quantity::new(too_big),
            Err(QuantityError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_checked_add() {
        let sum = Quantity::new(2).unwrap().checked_add(Quantity::ONE).unwrap();
        assert_eq!(sum.get(), 3);
        assert!(
            Quantity::new(i64::from(u32::MAX))
                .unwrap()
                .checked_add(Quantity::ONE)
                .is_err()
        );
    }

    #[test]
    fn test_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("5").unwrap().get(), 5);
    }
}
