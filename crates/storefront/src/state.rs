//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::ledger::LedgerClient;
use crate::services::checkout::AccountLocks;
use crate::services::email::EmailService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    ledger: LedgerClient,
    email: Option<EmailService>,
    checkout_locks: AccountLocks,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    /// * `email` - Email service; `None` runs in dev mode where login
    ///   codes are logged and order emails are skipped
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool, email: Option<EmailService>) -> Self {
        let ledger = LedgerClient::new(&config.ledger);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                ledger,
                email,
                checkout_locks: AccountLocks::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the rewards ledger client.
    #[must_use]
    pub fn ledger(&self) -> &LedgerClient {
        &self.inner.ledger
    }

    /// Get the email service, if SMTP is configured.
    #[must_use]
    pub fn email_service(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// Get the per-account checkout lock registry.
    #[must_use]
    pub fn checkout_locks(&self) -> &AccountLocks {
        &self.inner.checkout_locks
    }
}
