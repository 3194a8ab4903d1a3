//! Order route handlers.
//!
//! Order placement delegates to [`CheckoutService`], which owns the
//! reconcile-debit-persist sequence. Handlers here only shape the JSON.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use perkstore_core::{OrderId, Points};

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::checkout::{CheckoutService, OrderReceipt};
use crate::state::AppState;

/// Order history response.
#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<Order>,
}

/// Response after a successful order placement.
///
/// `issues` lists non-fatal problems from the tail of the checkout
/// sequence and is omitted entirely on a clean run.
#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub order_id: OrderId,
    pub total_cost: Points,
    pub remaining_points: Points,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl From<OrderReceipt> for PlaceOrderResponse {
    fn from(receipt: OrderReceipt) -> Self {
        Self {
            success: true,
            order_id: receipt.order_id,
            total_cost: receipt.total_cost,
            remaining_points: receipt.remaining_points,
            issues: receipt.issues,
        }
    }
}

/// List the current account's orders, newest first.
///
/// GET /api/orders
#[instrument(skip(state, account), fields(account_id = %account.id))]
pub async fn list_orders(
    State(state): State<AppState>,
    RequireAuth(account): RequireAuth,
) -> Result<Json<OrdersResponse>, AppError> {
    let orders = OrderRepository::new(state.pool())
        .list_for_account(account.id)
        .await?;

    Ok(Json(OrdersResponse { orders }))
}

/// Place an order from the current cart.
///
/// POST /api/orders
#[instrument(skip(state, account), fields(account_id = %account.id))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireAuth(account): RequireAuth,
) -> Result<Json<PlaceOrderResponse>, AppError> {
    let receipt = CheckoutService::new(&state).place_order(&account).await?;

    Ok(Json(receipt.into()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn receipt(issues: Vec<String>) -> PlaceOrderResponse {
        PlaceOrderResponse::from(OrderReceipt {
            order_id: OrderId::new(7),
            total_cost: Points::new(500),
            remaining_points: Points::new(1500),
            issues,
        })
    }

    #[test]
    fn test_clean_receipt_omits_issues() {
        let json = serde_json::to_value(receipt(Vec::new())).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["order_id"], 7);
        assert_eq!(json["total_cost"], 500);
        assert_eq!(json["remaining_points"], 1500);
        assert!(json.get("issues").is_none());
    }

    #[test]
    fn test_degraded_receipt_lists_issues() {
        let json = serde_json::to_value(receipt(vec![
            "Your order confirmation email could not be sent".to_string(),
        ]))
        .unwrap();

        assert_eq!(json["issues"][0], "Your order confirmation email could not be sent");
    }
}
