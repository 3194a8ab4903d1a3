//! Order placement coordinator.
//!
//! Turns a cart into a persisted, debited order. The sequence is fixed:
//!
//! 1. Load the account behind the session.
//! 2. Load the cart and reconcile it against live stock and prices.
//! 3. Check the points balance covers the total.
//! 4. Persist the order with a pending debit status.
//! 5. Debit the ledger and record the outcome on the order.
//! 6. Decrement stock for every line.
//! 7. Send order emails.
//! 8. Clear the cart.
//!
//! Persisting the order is the point of no return. Before it, any
//! failure aborts with nothing written. After it, the order row stays
//! whatever happens: a refused debit is recorded on the order and
//! surfaced as an error, while stock, email, and cart-clear problems
//! degrade to issues on an otherwise successful receipt.
//!
//! Steps 2 through 6 run under a per-account lock so two concurrent
//! requests from the same account cannot both pass the points check
//! against the same balance.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::instrument;

use perkstore_core::{AccountId, OrderId, Points};

use crate::db::{
    AccountRepository, CartRepository, OrderRepository, ProductRepository, RepositoryError,
};
use crate::error::add_breadcrumb;
use crate::ledger::{BalanceReading, DebitOutcome};
use crate::models::{CurrentAccount, DebitStatus};
use crate::services::inventory::{ReconcileError, reconcile};
use crate::services::notifications::dispatch_order_emails;
use crate::state::AppState;

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The session does not map to an existing account.
    #[error("account is not signed in or no longer exists")]
    Unauthorized,

    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line asks for more units than are in stock.
    #[error("insufficient stock for \"{product}\": requested {requested}, available {available}")]
    InsufficientStock {
        /// Display name of the product that ran out.
        product: String,
        /// Units the cart asked for.
        requested: i32,
        /// Units actually in stock.
        available: i32,
    },

    /// The balance does not cover the order total.
    #[error("insufficient points: required {required}, available {available}")]
    InsufficientPoints {
        /// Order total.
        required: Points,
        /// Balance the ledger reported.
        available: Points,
    },

    /// The balance could not be read, so the order was not placed.
    #[error("points balance unavailable: {reason}")]
    LedgerUnavailable {
        /// What went wrong talking to the ledger.
        reason: String,
    },

    /// A database write failed.
    #[error("order persistence failed: {0}")]
    PersistenceError(#[from] RepositoryError),

    /// The order was persisted but the ledger debit did not complete.
    #[error("points debit did not complete for order {order_id}: {outcome:?}")]
    DebitFailed {
        /// The order the debit belonged to.
        order_id: OrderId,
        /// What the ledger said (or failed to say).
        outcome: DebitOutcome,
    },
}

impl From<ReconcileError> for CheckoutError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::EmptyCart => Self::EmptyCart,
            ReconcileError::InsufficientStock {
                product,
                requested,
                available,
            } => Self::InsufficientStock {
                product,
                requested,
                available,
            },
        }
    }
}

/// What the buyer gets back after a successful order.
#[derive(Debug, Serialize)]
pub struct OrderReceipt {
    /// Persisted order ID.
    pub order_id: OrderId,
    /// Points charged.
    pub total_cost: Points,
    /// Balance after the debit.
    pub remaining_points: Points,
    /// Non-fatal problems from the tail of the sequence (stock
    /// adjustment, emails, cart clearing). Empty on a clean run.
    pub issues: Vec<String>,
}

/// Per-account checkout locks.
///
/// One lock per account, created on first use and kept for the life of
/// the process. The map only ever grows, which is fine for a
/// workforce-sized account population.
#[derive(Debug, Default)]
pub struct AccountLocks {
    locks: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    /// Create an empty lock registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for an account, waiting if another task holds it.
    pub async fn acquire(&self, account_id: AccountId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(account_id).or_default())
        };
        lock.lock_owned().await
    }
}

/// Check that a balance reading covers the order total.
///
/// An unreadable balance aborts the order; it must never be mistaken
/// for a zero balance here.
fn check_balance(reading: BalanceReading, total: Points) -> Result<Points, CheckoutError> {
    match reading {
        BalanceReading::Known(available) if available >= total => Ok(available),
        BalanceReading::Known(available) => Err(CheckoutError::InsufficientPoints {
            required: total,
            available,
        }),
        BalanceReading::Unavailable { reason } => Err(CheckoutError::LedgerUnavailable { reason }),
    }
}

/// Order placement service.
pub struct CheckoutService<'a> {
    state: &'a AppState,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Place an order for everything in the account's cart.
    ///
    /// # Errors
    ///
    /// Before the order row exists: `Unauthorized`, `EmptyCart`,
    /// `InsufficientStock`, `InsufficientPoints`, `LedgerUnavailable`,
    /// or `PersistenceError`, all with nothing charged. After it:
    /// `DebitFailed` when the ledger refused the withdrawal or its
    /// outcome could not be determined; the order row keeps the
    /// recorded debit status either way.
    #[instrument(skip(self, current), fields(account_id = %current.id))]
    pub async fn place_order(&self, current: &CurrentAccount) -> Result<OrderReceipt, CheckoutError> {
        // Step 1: the session cookie can outlive the account row.
        let account = AccountRepository::new(self.state.pool())
            .get_by_id(current.id)
            .await?
            .ok_or(CheckoutError::Unauthorized)?;

        add_breadcrumb("checkout", "Order placement started", None);

        // Steps 2-6 run under the account lock.
        let guard = self.state.checkout_locks().acquire(current.id).await;

        // Step 2: reconcile the cart against live stock and prices.
        let lines = CartRepository::new(self.state.pool())
            .list(current.id)
            .await?;
        let reconciled = reconcile(&lines)?;

        // Step 3: the balance must cover the total before anything is
        // written.
        let reading = self
            .state
            .ledger()
            .get_balance(&account.ledger_user_id)
            .await;
        let available = check_balance(reading, reconciled.total_cost)?;

        // Step 4: persist the order. Point of no return.
        let orders = OrderRepository::new(self.state.pool());
        let order = orders
            .create(
                account.id,
                &account.display_name(),
                &account.email,
                &reconciled.items,
                reconciled.total_cost,
            )
            .await?;

        add_breadcrumb(
            "checkout",
            "Order persisted",
            Some(&[("order_id", &order.id.to_string())]),
        );

        let mut issues = Vec::new();

        // Step 5: debit the ledger and record the outcome. A debit that
        // did not complete is an error the buyer sees, never a silent
        // success.
        let reason = format!("Perkstore order #{}", order.id);
        let outcome = self
            .state
            .ledger()
            .debit(&account.ledger_user_id, reconciled.total_cost, &reason)
            .await;

        match outcome {
            DebitOutcome::Debited => {
                if let Err(err) = orders.mark_debit_status(order.id, DebitStatus::Debited).await {
                    // The points are gone and the order stands; a stale
                    // pending status is an operator problem, not a buyer one.
                    tracing::error!(
                        order_id = %order.id,
                        error = %err,
                        "Debit succeeded but the order status could not be updated"
                    );
                    issues.push("Order status update is delayed".to_string());
                }
            }
            outcome @ (DebitOutcome::Declined { .. } | DebitOutcome::Unknown { .. }) => {
                let status = if matches!(outcome, DebitOutcome::Unknown { .. }) {
                    DebitStatus::Unknown
                } else {
                    DebitStatus::Failed
                };
                tracing::error!(
                    order_id = %order.id,
                    outcome = ?outcome,
                    "Points debit did not complete"
                );
                if let Err(err) = orders.mark_debit_status(order.id, status).await {
                    tracing::error!(
                        order_id = %order.id,
                        error = %err,
                        "Failed to record debit outcome on order"
                    );
                }
                return Err(CheckoutError::DebitFailed {
                    order_id: order.id,
                    outcome,
                });
            }
        }

        // Step 6: decrement stock. The order is final; a line that can no
        // longer be decremented (another account bought the last units
        // between reconcile and here) is an oversell to resolve manually,
        // not a reason to unwind the debit.
        let products = ProductRepository::new(self.state.pool());
        for item in &reconciled.items {
            match products.decrement_stock(item.product_id, item.quantity).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::error!(
                        order_id = %order.id,
                        product_id = %item.product_id,
                        quantity = item.quantity,
                        "Stock fell below the ordered quantity during checkout"
                    );
                    issues.push(format!(
                        "Stock for \"{}\" needs manual adjustment",
                        item.name
                    ));
                }
                Err(err) => {
                    tracing::error!(
                        order_id = %order.id,
                        product_id = %item.product_id,
                        error = %err,
                        "Failed to adjust stock"
                    );
                    issues.push(format!(
                        "Stock for \"{}\" needs manual adjustment",
                        item.name
                    ));
                }
            }
        }

        drop(guard);

        // Step 7: order emails, best effort.
        issues.extend(dispatch_order_emails(self.state.email_service(), &order).await);

        // Step 8: clear the cart, best effort.
        if let Err(err) = CartRepository::new(self.state.pool()).clear(current.id).await {
            tracing::warn!(
                order_id = %order.id,
                error = %err,
                "Failed to clear cart after checkout"
            );
            issues.push("Your cart could not be cleared".to_string());
        }

        tracing::info!(
            order_id = %order.id,
            total_cost = %reconciled.total_cost,
            "Order placed"
        );

        Ok(OrderReceipt {
            order_id: order.id,
            total_cost: reconciled.total_cost,
            remaining_points: available.saturating_sub(reconciled.total_cost),
            issues,
        })
    }
}
