//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness probe
//! GET  /health/ready            - Readiness probe (checks Postgres)
//!
//! # Auth (stricter rate limit)
//! POST /api/auth/check-email    - Directory lookup for an email
//! POST /api/auth/send-code      - Email a one-time sign-in code
//! POST /api/auth/verify-code    - Verify the code, establish session
//! POST /api/auth/logout         - Clear the session identity
//!
//! # Catalog (public)
//! GET  /api/products            - List products (?category=merch|gifts)
//!
//! # Cart (requires auth)
//! GET    /api/cart              - Cart contents with live product data
//! POST   /api/cart              - Add a product
//! DELETE /api/cart              - Remove a product
//!
//! # Orders (requires auth)
//! GET  /api/orders              - Order history, newest first
//! POST /api/orders              - Place an order from the cart
//!
//! # Account (requires auth)
//! GET  /api/account/info        - Profile
//! GET  /api/account/points      - Live points balance
//! GET  /api/account/is-admin    - Admin flag
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
///
/// The tight rate limit here is what makes six-digit codes safe to
/// brute-force-resist; see [`crate::middleware::auth_rate_limiter`].
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/check-email", post(auth::check_email))
        .route("/send-code", post(auth::send_code))
        .route("/verify-code", post(auth::verify_code))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the storefront API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::list_products))
        .route(
            "/cart",
            get(cart::show_cart)
                .post(cart::add_to_cart)
                .delete(cart::remove_from_cart),
        )
        .route(
            "/orders",
            get(orders::list_orders).post(orders::place_order),
        )
        .route("/account/info", get(account::account_info))
        .route("/account/points", get(account::account_points))
        .route("/account/is-admin", get(account::is_admin))
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new().nest(
        "/api",
        Router::new()
            .nest("/auth", auth_routes())
            .merge(api_routes()),
    )
}
