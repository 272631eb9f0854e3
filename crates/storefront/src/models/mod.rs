//! Domain models for the cart/checkout layer.
//!
//! These are validated domain types. Persistence adapters in [`crate::store`]
//! and [`crate::db`] translate them to and from their stored document shape.

pub mod cart;
pub mod profile;
pub mod session;

pub use cart::{CartLine, NewCartItem, PurchaseRecord, item_count, subtotal};
pub use profile::{NewProfile, Profile, ProfilePatch};
pub use session::{LocalSnapshot, Session};
