//! `EcoFinds` storefront library.
//!
//! Keeps a shopper's cart and purchase history in sync with durable storage:
//! the account's profile document when signed in, a local fallback store
//! otherwise. [`state::AppState`] wires the pieces together.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
