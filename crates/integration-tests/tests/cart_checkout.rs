//! Cart and checkout scenarios for signed-in accounts.

#![allow(clippy::unwrap_used)]

use ecofinds_core::AccountId;
use ecofinds_integration_tests::TestContext;
use ecofinds_storefront::error::CartError;
use ecofinds_storefront::models::{NewCartItem, item_count, subtotal};
use ecofinds_storefront::services::{CheckoutOutcome, CheckoutRejection};
use ecofinds_storefront::store::ProfileStore;
use rust_decimal::Decimal;

fn lamp() -> NewCartItem {
    NewCartItem::new("p1").title("Lamp").price(Decimal::from(1200))
}

#[tokio::test]
async fn test_add_merges_into_single_line() {
    let ctx = TestContext::new();
    let engine = ctx.state.cart();
    let mut session = ctx.state.sessions().sign_up("Mira").await.unwrap();

    engine.add_to_cart(&mut session, lamp(), Some(2)).await.unwrap();
    let cart = engine
        .add_to_cart(&mut session, NewCartItem::new("p1"), Some(1))
        .await
        .unwrap();

    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].id.as_str(), "p1");
    assert_eq!(cart[0].qty.get(), 3);
    assert_eq!(cart[0].price.amount(), Decimal::from(1200));

    let stored = ctx
        .profiles
        .load(session.identity().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.cart, cart);
}

#[tokio::test]
async fn test_checkout_two_lines() {
    let ctx = TestContext::new();
    let engine = ctx.state.cart();
    let mut session = ctx.state.sessions().sign_up("Mira").await.unwrap();
    engine.add_to_cart(&mut session, lamp(), Some(2)).await.unwrap();
    engine
        .add_to_cart(
            &mut session,
            NewCartItem::new("p2").title("Chair").price(Decimal::from(3500)),
            Some(1),
        )
        .await
        .unwrap();
    assert_eq!(item_count(engine.get_cart(&session)), 3);
    assert_eq!(
        subtotal(engine.get_cart(&session)).amount(),
        Decimal::from(5900)
    );

    let outcome = engine.checkout_cart(&mut session).await.unwrap();

    let bought = outcome.purchases();
    assert_eq!(bought.len(), 2);
    assert_eq!(bought[0].bought_at, bought[1].bought_at);
    assert!(engine.get_cart(&session).is_empty());
    assert_eq!(engine.get_purchases(&session), bought);

    let stored = ctx
        .profiles
        .load(session.identity().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(stored.cart.is_empty());
    assert_eq!(stored.purchases, bought);
}

#[tokio::test]
async fn test_checkout_empty_cart_changes_nothing() {
    let ctx = TestContext::new();
    let mut session = ctx.state.sessions().sign_up("Mira").await.unwrap();
    let before = session.clone();

    let outcome = ctx.state.cart().checkout_cart(&mut session).await.unwrap();

    assert_eq!(
        outcome,
        CheckoutOutcome::Rejected(CheckoutRejection::EmptyCart)
    );
    assert_eq!(
        serde_json::to_value(&outcome).unwrap()["reason"],
        "empty-cart"
    );
    assert_eq!(session, before);
}

#[tokio::test]
async fn test_set_qty_zero_removes_and_unknown_is_noop() {
    let ctx = TestContext::new();
    let engine = ctx.state.cart();
    let mut session = ctx.state.sessions().sign_up("Mira").await.unwrap();
    engine.add_to_cart(&mut session, lamp(), Some(2)).await.unwrap();

    let cart = engine.set_cart_qty(&mut session, "p9", 4).await.unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].qty.get(), 2);

    let cart = engine.set_cart_qty(&mut session, "p1", 0).await.unwrap();
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_write_failure_is_retryable_and_keeps_session() {
    let ctx = TestContext::new();
    let engine = ctx.state.cart();
    let mut session = ctx.state.sessions().sign_up("Mira").await.unwrap();
    engine.add_to_cart(&mut session, lamp(), Some(1)).await.unwrap();
    let before = session.clone();

    ctx.profiles.fail_writes(true);
    let err = engine.checkout_cart(&mut session).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(session, before);

    ctx.profiles.fail_writes(false);
    let outcome = engine.checkout_cart(&mut session).await.unwrap();
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_missing_profile_fails_cart_operations() {
    let ctx = TestContext::new();
    let mut session = ctx
        .state
        .sessions()
        .sign_in(AccountId::parse("no-profile").unwrap())
        .await
        .unwrap();

    let err = ctx
        .state
        .cart()
        .add_to_cart(&mut session, lamp(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::ProfileNotLoaded(_)));
}
