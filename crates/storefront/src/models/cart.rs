//! Cart types.
//!
//! A cart is a set of `(account, product)` lines. Each line caches the
//! cost computed when it was added; checkout recomputes costs from live
//! catalog prices, so the cached value is advisory only.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use perkstore_core::{AccountId, Points, ProductId};

/// A raw cart line as stored in `cart_items`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartItem {
    /// Owning account.
    pub account_id: AccountId,
    /// Product in the cart.
    pub product_id: ProductId,
    /// Units requested. Always positive.
    pub quantity: i32,
    /// Line cost cached when the item was added (unit price at that time
    /// multiplied by quantity).
    pub price: Points,
    /// When the line was last modified.
    pub updated_at: DateTime<Utc>,
}

/// A cart line joined with live product data.
///
/// This is what cart display and checkout both operate on: the cached
/// line cost plus the product's current price and stock.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartLine {
    /// Product in the cart.
    pub product_id: ProductId,
    /// Product display name.
    pub name: String,
    /// Units requested.
    pub quantity: i32,
    /// Line cost cached at add-to-cart time.
    pub price: Points,
    /// Current unit price from the catalog.
    pub unit_price: Points,
    /// Units currently in stock.
    pub remains: i32,
    /// Product image URLs.
    pub image_urls: Vec<String>,
}

impl CartLine {
    /// Line cost recomputed from the live unit price.
    ///
    /// Checkout charges this amount, not the cached `price`, so stale
    /// carts pick up price changes instead of honoring old prices.
    #[must_use]
    pub const fn live_cost(&self) -> Points {
        self.unit_price.saturating_mul(self.quantity as i64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_live_cost_uses_current_unit_price() {
        let line = CartLine {
            product_id: ProductId::new(7),
            name: "Hoodie".to_string(),
            quantity: 2,
            price: Points::new(1000),
            unit_price: Points::new(600),
            remains: 5,
            image_urls: vec![],
        };

        // Cached cost was 2 x 500; the price has since risen to 600.
        assert_eq!(line.live_cost(), Points::new(1200));
    }
}
