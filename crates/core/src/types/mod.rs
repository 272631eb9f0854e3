//! Core types for EcoFinds.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod display_name;
pub mod id;
pub mod price;
pub mod quantity;

pub use display_name::{DisplayName, DisplayNameError};
pub use id::*;
pub use price::{CurrencyCode, Price, PriceError};
pub use quantity::{Quantity, QuantityError};
