//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Email one-time-code login against the ledger employee directory
//! - `checkout` - Order placement coordinator (pricing, stock, points debit)
//! - `email` - Email delivery via SMTP
//! - `inventory` - Cart-to-order reconciliation against live stock and prices
//! - `notifications` - Post-order email dispatch (buyer receipt, fulfillment)

pub mod auth;
pub mod checkout;
pub mod email;
pub mod inventory;
pub mod notifications;

pub use auth::{AuthError, AuthService, VerifiedLogin};
pub use checkout::{AccountLocks, CheckoutError, CheckoutService, OrderReceipt};
pub use email::{EmailError, EmailService, OrderEmailLine, generate_verification_code};
pub use inventory::{Reconciled, ReconcileError, reconcile};
pub use notifications::dispatch_order_emails;
