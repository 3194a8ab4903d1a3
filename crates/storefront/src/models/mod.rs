//! Domain models for the rewards storefront.
//!
//! Row types map directly onto the `PostgreSQL` schema via `sqlx::FromRow`.
//! Point-valued columns decode into [`perkstore_core::Points`] and emails
//! into [`perkstore_core::Email`], so invalid data surfaces as decode
//! errors instead of leaking into handlers.

pub mod account;
pub mod cart;
pub mod order;
pub mod product;
pub mod session;

pub use account::Account;
pub use cart::{CartItem, CartLine};
pub use order::{DebitStatus, Order, OrderItem};
pub use product::Product;
pub use session::CurrentAccount;
