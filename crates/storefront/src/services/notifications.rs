//! Post-order email dispatch.
//!
//! An order that is persisted and debited is final. Email failures after
//! that point must not fail the request, so this dispatcher never
//! returns an error: every problem is logged and reported back as a
//! receipt issue string instead.

use crate::models::Order;
use crate::services::email::{EmailService, OrderEmailLine};

/// Send the buyer receipt and the fulfillment notification for an order.
///
/// Both emails go out concurrently. Returns a human-readable issue for
/// each one that failed; an empty list means both were delivered (or
/// that no email service is configured, which is logged and skipped).
pub async fn dispatch_order_emails(email: Option<&EmailService>, order: &Order) -> Vec<String> {
    let Some(service) = email else {
        tracing::info!(
            order_id = %order.id,
            "Email service not configured, skipping order emails"
        );
        return Vec::new();
    };

    let lines: Vec<OrderEmailLine> = order.items.iter().map(OrderEmailLine::from).collect();

    let (confirmation, notification) = tokio::join!(
        service.send_order_confirmation(order.email.as_str(), &lines, order.total_cost),
        service.send_order_notification(
            &order.user_name,
            order.email.as_str(),
            &lines,
            order.total_cost,
        ),
    );

    let mut issues = Vec::new();

    if let Err(err) = confirmation {
        tracing::warn!(
            order_id = %order.id,
            error = %err,
            "Failed to send order confirmation email"
        );
        issues.push("Your order confirmation email could not be sent".to_string());
    }

    if let Err(err) = notification {
        tracing::warn!(
            order_id = %order.id,
            error = %err,
            "Failed to send fulfillment notification email"
        );
        issues.push("The fulfillment team notification could not be sent".to_string());
    }

    issues
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use sqlx::types::Json;

    use perkstore_core::{AccountId, Email, OrderId, Points, ProductId};

    use crate::models::{DebitStatus, OrderItem};

    use super::*;

    #[tokio::test]
    async fn test_missing_email_service_is_not_an_issue() {
        let order = Order {
            id: OrderId::new(1),
            account_id: AccountId::new(uuid::Uuid::new_v4()),
            user_name: "Jamie Fox".to_string(),
            email: Email::parse("jamie@example.com").unwrap(),
            items: Json(vec![OrderItem {
                product_id: ProductId::new(1),
                name: "Branded cap".to_string(),
                quantity: 1,
                price: Points::new(700),
            }]),
            total_cost: Points::new(700),
            debit_status: DebitStatus::Debited,
            created_at: Utc::now(),
        };

        let issues = dispatch_order_emails(None, &order).await;

        assert!(issues.is_empty());
    }
}
