//! Order repository.

use sqlx::PgPool;
use sqlx::types::Json;

use perkstore_core::{AccountId, Email, OrderId, Points};

use super::RepositoryError;
use crate::models::{DebitStatus, Order, OrderItem};

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new order with `debit_status = 'pending'`.
    ///
    /// This is the point of no return for checkout: once this row
    /// exists the order stands, whatever happens to the ledger debit
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        account_id: AccountId,
        user_name: &str,
        email: &Email,
        items: &[OrderItem],
        total_cost: Points,
    ) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            INSERT INTO orders (account_id, user_name, email, items, total_cost, debit_status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, account_id, user_name, email, items, total_cost,
                      debit_status, created_at
            ",
        )
        .bind(account_id)
        .bind(user_name)
        .bind(email)
        .bind(Json(items))
        .bind(total_cost)
        .bind(DebitStatus::Pending)
        .fetch_one(self.pool)
        .await?;

        Ok(order)
    }

    /// Record the outcome of the ledger debit for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn mark_debit_status(
        &self,
        id: OrderId,
        status: DebitStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET debit_status = $2
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// List the account's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r"
            SELECT id, account_id, user_name, email, items, total_cost,
                   debit_status, created_at
            FROM orders
            WHERE account_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(account_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }
}
