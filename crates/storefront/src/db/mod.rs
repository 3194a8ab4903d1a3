//! Database operations for storefront `PostgreSQL`.
//!
//! # Database: `perkstore`
//!
//! The database is the system of record for catalog, carts, and orders.
//! Point balances are NOT stored here; the external rewards ledger owns
//! them and is queried live.
//!
//! ## Tables
//!
//! - `accounts` - Storefront accounts mirroring ledger users
//! - `products` - Catalog with live stock counts
//! - `cart_items` - Per-account cart lines
//! - `orders` - Placed orders with a JSONB item snapshot
//! - `admins` - Email allowlist for administrative access
//! - `sessions` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations live in `crates/storefront/migrations/` and run automatically
//! at startup via [`run_migrations`].

pub mod accounts;
pub mod admins;
pub mod carts;
pub mod orders;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use accounts::AccountRepository;
pub use admins::AdminRepository;
pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use products::{CatalogFilter, ProductRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run pending migrations from `crates/storefront/migrations/`.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}
