//! Catalog product types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use perkstore_core::{Points, ProductId};

/// A catalog product priced in reward points.
///
/// `remains` is the live stock count. The database enforces `remains >= 0`
/// and all decrements are conditional, so it can never go negative.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Current price in points.
    pub price: Points,
    /// Previous price, shown struck through when a product is discounted.
    pub old_price: Option<Points>,
    /// Units left in stock.
    pub remains: i32,
    /// Whether the product belongs to the gifts category (vs. merch).
    pub is_gift: bool,
    /// Product image URLs in display order.
    pub image_urls: Vec<String>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether the requested quantity can currently be fulfilled.
    #[must_use]
    pub const fn has_stock(&self, quantity: i32) -> bool {
        quantity > 0 && quantity <= self.remains
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(remains: i32) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Thermo mug".to_string(),
            price: Points::new(500),
            old_price: None,
            remains,
            is_gift: false,
            image_urls: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_stock_within_remains() {
        assert!(product(3).has_stock(1));
        assert!(product(3).has_stock(3));
    }

    #[test]
    fn test_has_stock_rejects_excess_and_nonpositive() {
        assert!(!product(3).has_stock(4));
        assert!(!product(3).has_stock(0));
        assert!(!product(0).has_stock(1));
        assert!(!product(3).has_stock(-1));
    }
}
