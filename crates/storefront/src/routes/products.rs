//! Product catalog route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::db::{CatalogFilter, ProductRepository};
use crate::error::AppError;
use crate::models::Product;
use crate::state::AppState;

/// Optional category filter for the catalog listing.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub category: Option<String>,
}

/// Catalog listing response.
#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

/// List the catalog, optionally narrowed to one category.
///
/// GET /api/products?category=merch|gifts
///
/// Unknown category values fall back to the full catalog.
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<ProductsResponse>, AppError> {
    let filter = match query.category.as_deref() {
        Some("merch") => CatalogFilter::Merch,
        Some("gifts") => CatalogFilter::Gifts,
        _ => CatalogFilter::All,
    };

    let products = ProductRepository::new(state.pool()).list(filter).await?;

    Ok(Json(ProductsResponse { products }))
}
