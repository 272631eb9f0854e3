//! EcoFinds Core - Shared domain types.
//!
//! This crate provides the types used across the EcoFinds components:
//! - `storefront` - Cart, checkout and profile synchronization
//! - `cli` - Command-line tools for migrations and driving the cart
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, quantities and display names

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
