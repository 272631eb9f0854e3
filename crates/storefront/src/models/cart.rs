//! Cart lines and purchase records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ecofinds_core::{Price, ProductId, Quantity};

use crate::error::CartError;

/// A product the caller wants to put in the cart.
///
/// This is unvalidated input from the presentation layer: every field except
/// `id` is optional and missing ones default to empty or zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    /// Listing id.
    #[serde(default)]
    pub id: String,
    /// Listing title.
    #[serde(default, alias = "t")]
    pub title: Option<String>,
    /// Unit price.
    #[serde(default, alias = "pr")]
    pub price: Option<Decimal>,
    /// Image URL or storage reference.
    #[serde(default, alias = "img")]
    pub image_ref: Option<String>,
}

impl NewCartItem {
    /// Start an item with only an id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the unit price.
    #[must_use]
    pub fn price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    /// Set the image reference.
    #[must_use]
    pub fn image_ref(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    /// Validate the item and turn it into a cart line of `qty` units.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidInput` if the id is blank or the price is
    /// negative.
    pub fn into_line(self, qty: Quantity) -> Result<CartLine, CartError> {
        let id = ProductId::parse(&self.id)
            .map_err(|e| CartError::InvalidInput(format!("item id: {e}")))?;
        let price = match self.price {
            Some(amount) => {
                Price::new(amount).map_err(|e| CartError::InvalidInput(e.to_string()))?
            }
            None => Price::ZERO,
        };

        Ok(CartLine {
            id,
            title: self.title.unwrap_or_default(),
            price,
            qty,
            image_ref: self.image_ref.unwrap_or_default(),
        })
    }
}

/// One product entry in a cart.
///
/// A cart holds at most one line per product id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: ProductId,
    #[serde(default, alias = "t")]
    pub title: String,
    #[serde(default, alias = "pr")]
    pub price: Price,
    pub qty: Quantity,
    #[serde(default, alias = "img")]
    pub image_ref: String,
}

impl CartLine {
    /// Price of the whole line (`price * qty`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.qty.get())
    }
}

/// Immutable record of one purchased cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub product_id: ProductId,
    #[serde(default, alias = "t")]
    pub title: String,
    #[serde(default, alias = "pr")]
    pub price: Price,
    pub qty: Quantity,
    #[serde(default, alias = "img")]
    pub image_ref: String,
    pub bought_at: DateTime<Utc>,
}

impl PurchaseRecord {
    /// Record the purchase of `line` at `bought_at`.
    #[must_use]
    pub fn from_line(line: &CartLine, bought_at: DateTime<Utc>) -> Self {
        Self {
            product_id: line.id.clone(),
            title: line.title.clone(),
            price: line.price,
            qty: line.qty,
            image_ref: line.image_ref.clone(),
            bought_at,
        }
    }

    /// Price paid for the whole record.
    #[must_use]
    pub fn total(&self) -> Price {
        self.price.times(self.qty.get())
    }
}

/// Sum of all line totals.
#[must_use]
pub fn subtotal(lines: &[CartLine]) -> Price {
    lines
        .iter()
        .fold(Price::ZERO, |acc, line| acc.plus(line.line_total()))
}

/// Total number of units across all lines.
#[must_use]
pub fn item_count(lines: &[CartLine]) -> u64 {
    lines.iter().map(|line| u64::from(line.qty.get())).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: &str, price: i64, qty: i64) -> CartLine {
        NewCartItem::new(id)
            .price(Decimal::from(price))
            .into_line(Quantity::new(qty).unwrap())
            .unwrap()
    }

    #[test]
    fn test_into_line_defaults_missing_fields() {
        let line = NewCartItem::new("p1").into_line(Quantity::ONE).unwrap();
        assert_eq!(line.id.as_str(), "p1");
        assert_eq!(line.title, "");
        assert_eq!(line.price, Price::ZERO);
        assert_eq!(line.image_ref, "");
    }

    #[test]
    fn test_into_line_rejects_blank_id() {
        let err = NewCartItem::new("  ").into_line(Quantity::ONE).unwrap_err();
        assert!(matches!(err, CartError::InvalidInput(_)));
    }

    #[test]
    fn test_into_line_rejects_negative_price() {
        let err = NewCartItem::new("p1")
            .price(Decimal::from(-1))
            .into_line(Quantity::ONE)
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidInput(_)));
    }

    #[test]
    fn test_subtotal_and_item_count() {
        let cart = vec![line("p1", 1200, 2), line("p2", 3500, 1)];
        assert_eq!(subtotal(&cart).amount(), Decimal::from(5900));
        assert_eq!(item_count(&cart), 3);
        assert_eq!(subtotal(&[]), Price::ZERO);
    }

    #[test]
    fn test_cart_line_json_shape() {
        let json = serde_json::to_value(line("p1", 1200, 2)).unwrap();
        assert_eq!(json["id"], "p1");
        assert_eq!(json["qty"], 2);
        assert_eq!(json["price"], 1200);
        assert!(json.get("imageRef").is_some());
    }

    #[test]
    fn test_cart_line_accepts_legacy_field_names() {
        let line: CartLine = serde_json::from_str(
            r#"{"id":"p9","t":"Office Chair","pr":3500,"qty":1,"img":"chair.png"}"#,
        )
        .unwrap();
        assert_eq!(line.title, "Office Chair");
        assert_eq!(line.price.amount(), Decimal::from(3500));
        assert_eq!(line.image_ref, "chair.png");
    }

    #[test]
    fn test_purchase_record_copies_line() {
        let now = Utc::now();
        let record = PurchaseRecord::from_line(&line("p1", 1200, 2), now);
        assert_eq!(record.product_id.as_str(), "p1");
        assert_eq!(record.qty.get(), 2);
        assert_eq!(record.bought_at, now);
        assert_eq!(record.total().amount(), Decimal::from(2400));
    }
}
