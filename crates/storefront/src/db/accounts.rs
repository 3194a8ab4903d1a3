//! Account repository.
//!
//! Accounts are keyed by the external ledger user ID. Login re-resolves
//! the employee against the ledger directory and upserts here, so names
//! and emails track the directory over time.

use sqlx::PgPool;

use perkstore_core::{AccountId, Email};

use super::RepositoryError;
use crate::models::Account;

/// Repository for account database operations.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an account by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let account = sqlx::query_as::<_, Account>(
            r"
            SELECT id, ledger_user_id, email, first_name, last_name, created_at, updated_at
            FROM accounts
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(account)
    }

    /// Create or refresh the account for a ledger directory user.
    ///
    /// Keyed on `ledger_user_id`: a returning employee gets their email
    /// and name refreshed from the directory instead of a second row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already taken
    /// by a different ledger user.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn upsert(
        &self,
        ledger_user_id: &str,
        email: &Email,
        first_name: &str,
        last_name: &str,
    ) -> Result<Account, RepositoryError> {
        let account = sqlx::query_as::<_, Account>(
            r"
            INSERT INTO accounts (id, ledger_user_id, email, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (ledger_user_id) DO UPDATE
            SET email = EXCLUDED.email,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                updated_at = NOW()
            RETURNING id, ledger_user_id, email, first_name, last_name, created_at, updated_at
            ",
        )
        .bind(AccountId::new(uuid::Uuid::new_v4()))
        .bind(ledger_user_id)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(
                    "email already belongs to another account".to_owned(),
                );
            }
            RepositoryError::Database(e)
        })?;

        Ok(account)
    }
}
