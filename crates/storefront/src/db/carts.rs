//! Cart repository.
//!
//! Carts live in `cart_items`, keyed by `(account_id, product_id)`.
//! Adding a product that is already in the cart merges quantities and
//! recomputes the cached line cost at the current unit price.

use sqlx::PgPool;

use perkstore_core::{AccountId, Points, ProductId};

use super::RepositoryError;
use crate::models::{CartItem, CartLine};

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the account's cart lines joined with live product data.
    ///
    /// Ordered by product ID so checkout processes lines in a stable
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, account_id: AccountId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(
            r"
            SELECT c.product_id, p.name, c.quantity, c.price,
                   p.price AS unit_price, p.remains, p.image_urls
            FROM cart_items c
            JOIN products p ON p.id = c.product_id
            WHERE c.account_id = $1
            ORDER BY c.product_id ASC
            ",
        )
        .bind(account_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    /// Get a single cart line, if present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_item(
        &self,
        account_id: AccountId,
        product_id: ProductId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let item = sqlx::query_as::<_, CartItem>(
            r"
            SELECT account_id, product_id, quantity, price, updated_at
            FROM cart_items
            WHERE account_id = $1 AND product_id = $2
            ",
        )
        .bind(account_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(item)
    }

    /// Add units of a product to the cart.
    ///
    /// If the product is already in the cart the quantities merge, and
    /// the cached line cost is recomputed from `unit_price` over the
    /// merged quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_item(
        &self,
        account_id: AccountId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Points,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO cart_items (account_id, product_id, quantity, price)
            VALUES ($1, $2, $3, $4 * $3)
            ON CONFLICT (account_id, product_id) DO UPDATE
            SET quantity = cart_items.quantity + EXCLUDED.quantity,
                price = $4 * (cart_items.quantity + EXCLUDED.quantity),
                updated_at = NOW()
            ",
        )
        .bind(account_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Remove a product from the cart.
    ///
    /// Returns `true` if a line was removed, `false` if the product was
    /// not in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove_item(
        &self,
        account_id: AccountId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM cart_items
            WHERE account_id = $1 AND product_id = $2
            ",
        )
        .bind(account_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every line from the account's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, account_id: AccountId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM cart_items
            WHERE account_id = $1
            ",
        )
        .bind(account_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
