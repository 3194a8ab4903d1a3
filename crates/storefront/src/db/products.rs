//! Product repository.

use sqlx::PgPool;

use perkstore_core::ProductId;

use super::RepositoryError;
use crate::models::Product;

/// Catalog filter for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFilter {
    /// All products regardless of category.
    All,
    /// Only merch (`is_gift = false`).
    Merch,
    /// Only gifts (`is_gift = true`).
    Gifts,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products, in-stock items first, then cheapest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: CatalogFilter) -> Result<Vec<Product>, RepositoryError> {
        let is_gift = match filter {
            CatalogFilter::All => None,
            CatalogFilter::Merch => Some(false),
            CatalogFilter::Gifts => Some(true),
        };

        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, price, old_price, remains, is_gift, image_urls,
                   created_at, updated_at
            FROM products
            WHERE $1::boolean IS NULL OR is_gift = $1
            ORDER BY (remains > 0) DESC, price ASC, id ASC
            ",
        )
        .bind(is_gift)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, price, old_price, remains, is_gift, image_urls,
                   created_at, updated_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Atomically decrement stock for a fulfilled order line.
    ///
    /// The decrement only applies while enough stock remains, so two
    /// concurrent orders can never drive `remains` negative. Returns
    /// `true` if stock was taken, `false` if the guard lost the race.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET remains = remains - $2, updated_at = NOW()
            WHERE id = $1 AND remains >= $2
            ",
        )
        .bind(id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
