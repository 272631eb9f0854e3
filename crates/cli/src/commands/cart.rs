//! Cart and checkout commands.
//!
//! Without `--account` every command works on the local cart kept under
//! `ECOFINDS_LOCAL_STORE_DIR`. With `--account` it works on that account's
//! profile, which needs a database.
//!
//! # Usage
//!
//! ```bash
//! eco-cli cart add p1 --title Lamp --price 1200 --qty 2
//! eco-cli cart set p1 5
//! eco-cli cart remove p1
//! eco-cli cart show
//! eco-cli cart --account acct-1 checkout
//! eco-cli cart --account acct-1 purchases
//! ```

use clap::Subcommand;
use rust_decimal::Decimal;
use serde::Serialize;

use ecofinds_core::{CurrencyCode, Price};
use ecofinds_storefront::config::StorefrontConfig;
use ecofinds_storefront::models::{CartLine, NewCartItem, item_count, subtotal};

use super::{CliError, connect, parse_account, print_json};

#[derive(Subcommand)]
pub enum CartAction {
    /// Add an item, merging with an existing line
    Add {
        /// Product id
        id: String,

        #[arg(long)]
        title: Option<String>,

        /// Unit price
        #[arg(long)]
        price: Option<Decimal>,

        /// Image reference
        #[arg(long)]
        image: Option<String>,

        /// Units to add (defaults to 1)
        #[arg(short, long, allow_hyphen_values = true)]
        qty: Option<i64>,
    },
    /// Set a line's quantity (0 or less removes it)
    Set {
        /// Product id
        id: String,

        #[arg(allow_hyphen_values = true)]
        qty: i64,
    },
    /// Remove a line
    Remove {
        /// Product id
        id: String,
    },
    /// Print the cart with totals
    Show,
    /// Buy everything in the cart
    Checkout,
    /// Print the purchase history
    Purchases,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CartSummary<'a> {
    cart: &'a [CartLine],
    item_count: u64,
    subtotal: String,
}

impl<'a> CartSummary<'a> {
    fn new(cart: &'a [CartLine]) -> Self {
        Self {
            cart,
            item_count: item_count(cart),
            subtotal: subtotal(cart).display(CurrencyCode::default()),
        }
    }
}

/// Run a cart command against the local cart or `account`'s cart.
///
/// # Errors
///
/// Returns `CliError` if input is invalid, the profile is missing or a store
/// operation fails.
pub async fn run(
    config: StorefrontConfig,
    account: Option<&str>,
    action: CartAction,
) -> Result<(), CliError> {
    let state = connect(config, account.is_some()).await?;
    let engine = state.cart();
    let mut session = match account {
        Some(raw) => state.sessions().sign_in(parse_account(raw)?).await?,
        None => state.sessions().anonymous().await,
    };

    match action {
        CartAction::Add {
            id,
            title,
            price,
            image,
            qty,
        } => {
            let mut item = NewCartItem::new(id);
            if let Some(title) = title {
                item = item.title(title);
            }
            if let Some(price) = price {
                item = item.price(price);
            }
            if let Some(image) = image {
                item = item.image_ref(image);
            }
            let cart = engine.add_to_cart(&mut session, item, qty).await?;
            print_json(&CartSummary::new(&cart))
        }
        CartAction::Set { id, qty } => {
            let cart = engine.set_cart_qty(&mut session, &id, qty).await?;
            print_json(&CartSummary::new(&cart))
        }
        CartAction::Remove { id } => {
            let cart = engine.remove_from_cart(&mut session, &id).await?;
            print_json(&CartSummary::new(&cart))
        }
        CartAction::Show => print_json(&CartSummary::new(engine.get_cart(&session))),
        CartAction::Checkout => {
            let outcome = engine.checkout_cart(&mut session).await?;
            if let Some(reason) = outcome.rejection() {
                tracing::warn!(%reason, "Checkout rejected");
            } else {
                let total = outcome
                    .purchases()
                    .iter()
                    .fold(Price::ZERO, |acc, record| acc.plus(record.total()));
                tracing::info!(total = %total.display(CurrencyCode::default()), "Checkout total");
            }
            print_json(&outcome)
        }
        CartAction::Purchases => print_json(&engine.get_purchases(&session)),
    }
}
