//! Admin allowlist repository.
//!
//! `admins` is a plain email allowlist maintained by operations. There
//! is no admin UI in the storefront; membership only gates the admin
//! flag in account responses.

use sqlx::PgPool;

use perkstore_core::Email;

use super::RepositoryError;

/// Repository for the admin email allowlist.
pub struct AdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminRepository<'a> {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Whether the email is on the admin allowlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_admin(&self, email: &Email) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM admins WHERE email = $1)")
                .bind(email)
                .fetch_one(self.pool)
                .await?;

        Ok(exists)
    }
}
