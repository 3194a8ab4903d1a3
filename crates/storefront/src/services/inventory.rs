//! Cart-to-order reconciliation.
//!
//! Turns a cart into priced order items by checking every line against
//! live stock and repricing it from the live catalog. The cached line
//! cost stored with the cart is ignored here: what the buyer pays is the
//! unit price at the moment the order is placed.
//!
//! This is a pure function so the pricing and stock rules can be tested
//! without a database.

use thiserror::Error;

use perkstore_core::Points;

use crate::models::{CartLine, OrderItem};

/// Why a cart could not be turned into an order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A line asks for more units than are in stock.
    #[error("insufficient stock for \"{product}\": requested {requested}, available {available}")]
    InsufficientStock {
        /// Display name of the product that ran out.
        product: String,
        /// Units the cart asked for.
        requested: i32,
        /// Units actually in stock.
        available: i32,
    },
}

/// A cart successfully reconciled against live stock and prices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// Order items with the unit price frozen at reconciliation time.
    pub items: Vec<OrderItem>,
    /// Sum of all line costs.
    pub total_cost: Points,
}

/// Check every cart line against live stock and reprice it from the
/// live catalog.
///
/// Lines are checked in the order given; the first line that exceeds
/// its stock fails the whole cart. Nothing is partially fulfilled.
///
/// # Errors
///
/// Returns [`ReconcileError::EmptyCart`] for a cart with no lines and
/// [`ReconcileError::InsufficientStock`] for the first line whose
/// quantity exceeds the units in stock.
pub fn reconcile(lines: &[CartLine]) -> Result<Reconciled, ReconcileError> {
    if lines.is_empty() {
        return Err(ReconcileError::EmptyCart);
    }

    let mut items = Vec::with_capacity(lines.len());
    let mut total_cost = Points::new(0);

    for line in lines {
        if line.quantity > line.remains {
            return Err(ReconcileError::InsufficientStock {
                product: line.name.clone(),
                requested: line.quantity,
                available: line.remains,
            });
        }

        total_cost = total_cost.saturating_add(line.live_cost());
        items.push(OrderItem {
            product_id: line.product_id,
            name: line.name.clone(),
            quantity: line.quantity,
            price: line.unit_price,
        });
    }

    Ok(Reconciled { items, total_cost })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use perkstore_core::ProductId;

    use super::*;

    fn line(name: &str, quantity: i32, unit_price: i64, remains: i32) -> CartLine {
        CartLine {
            product_id: ProductId::new(1),
            name: name.to_string(),
            quantity,
            price: Points::new(0),
            unit_price: Points::new(unit_price),
            remains,
            image_urls: vec![],
        }
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        assert_eq!(reconcile(&[]), Err(ReconcileError::EmptyCart));
    }

    #[test]
    fn test_items_priced_from_live_unit_price() {
        // The cached line cost says 9999; the live unit price is 250.
        let mut stale = line("Mug", 2, 250, 10);
        stale.price = Points::new(9999);

        let reconciled = reconcile(&[stale]).unwrap();

        assert_eq!(reconciled.items.len(), 1);
        assert_eq!(reconciled.items[0].price, Points::new(250));
        assert_eq!(reconciled.total_cost, Points::new(500));
    }

    #[test]
    fn test_total_sums_all_lines() {
        let lines = vec![
            line("Cap", 2, 700, 5),    // 1400
            line("Bottle", 1, 350, 1), // 350
            line("Pen", 10, 20, 40),   // 200
        ];

        let reconciled = reconcile(&lines).unwrap();

        assert_eq!(reconciled.items.len(), 3);
        assert_eq!(reconciled.total_cost, Points::new(1950));
    }

    #[test]
    fn test_order_item_snapshots_unit_price_and_quantity() {
        let reconciled = reconcile(&[line("Cap", 3, 700, 5)]).unwrap();

        let item = &reconciled.items[0];
        assert_eq!(item.name, "Cap");
        assert_eq!(item.quantity, 3);
        assert_eq!(item.price, Points::new(700));
        assert_eq!(item.line_cost(), Points::new(2100));
    }

    #[test]
    fn test_stale_cart_fails_when_stock_ran_out() {
        // Cart was filled when 5 were available; 2 remain now.
        let result = reconcile(&[line("Hoodie", 5, 1200, 2)]);

        assert_eq!(
            result,
            Err(ReconcileError::InsufficientStock {
                product: "Hoodie".to_string(),
                requested: 5,
                available: 2,
            })
        );
    }

    #[test]
    fn test_exact_stock_passes() {
        let reconciled = reconcile(&[line("Hoodie", 2, 1200, 2)]).unwrap();
        assert_eq!(reconciled.total_cost, Points::new(2400));
    }

    #[test]
    fn test_first_failing_line_is_reported() {
        let lines = vec![line("Cap", 1, 700, 5), line("Mug", 4, 250, 0), line("Pen", 99, 20, 0)];

        let result = reconcile(&lines);

        assert!(matches!(
            result,
            Err(ReconcileError::InsufficientStock { ref product, .. }) if product == "Mug"
        ));
    }
}
