//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - Cart and checkout operations over the session's backing store
//! - `session` - Sign-up, sign-in, sign-out and profile loading

pub mod cart;
pub mod session;

pub use cart::{CartEngine, CheckoutOutcome, CheckoutRejection};
pub use session::{SessionError, SessionManager};
