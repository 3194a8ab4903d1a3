//! Cart route handlers.
//!
//! The cart is stored per account in Postgres, so it survives sessions
//! and devices. Stock is checked at add time as a courtesy; the
//! authoritative check happens again at checkout.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use perkstore_core::ProductId;

use crate::db::{CartRepository, ProductRepository};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::CartLine;
use crate::state::AppState;

/// Request to add a product to the cart.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Request to remove a product from the cart.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
}

/// Cart contents response.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartLine>,
}

/// Mutation acknowledgement.
#[derive(Debug, Serialize)]
pub struct CartMutationResponse {
    pub success: bool,
}

/// List the current account's cart with live product data.
///
/// GET /api/cart
#[instrument(skip(state, account), fields(account_id = %account.id))]
pub async fn show_cart(
    State(state): State<AppState>,
    RequireAuth(account): RequireAuth,
) -> Result<Json<CartResponse>, AppError> {
    let items = CartRepository::new(state.pool()).list(account.id).await?;

    Ok(Json(CartResponse { items }))
}

/// Add a product to the cart, merging quantity with any existing line.
///
/// POST /api/cart
#[instrument(skip(state, account, req), fields(account_id = %account.id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    RequireAuth(account): RequireAuth,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<CartMutationResponse>, AppError> {
    if req.quantity < 1 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let product = ProductRepository::new(state.pool())
        .get_by_id(req.product_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("Product is unavailable".to_string()))?;

    // The stock check covers the merged line, not just this request,
    // so repeated adds cannot build a cart no checkout could satisfy.
    let carts = CartRepository::new(state.pool());
    let in_cart = carts
        .get_item(account.id, product.id)
        .await?
        .map_or(0, |line| line.quantity);

    if !product.has_stock(in_cart.saturating_add(req.quantity)) {
        return Err(AppError::BadRequest(format!(
            "Only {} left of \"{}\"",
            product.remains, product.name
        )));
    }

    carts
        .add_item(account.id, product.id, req.quantity, product.price)
        .await?;

    Ok(Json(CartMutationResponse { success: true }))
}

/// Remove a product from the cart. Removing an absent line is a no-op.
///
/// DELETE /api/cart
#[instrument(skip(state, account, req), fields(account_id = %account.id))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    RequireAuth(account): RequireAuth,
    Json(req): Json<RemoveFromCartRequest>,
) -> Result<Json<CartMutationResponse>, AppError> {
    CartRepository::new(state.pool())
        .remove_item(account.id, req.product_id)
        .await?;

    Ok(Json(CartMutationResponse { success: true }))
}
