//! Order types.
//!
//! Orders are immutable once written. `items` is a JSONB snapshot of the
//! cart at checkout time, so later catalog edits never rewrite history.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use perkstore_core::{AccountId, Email, OrderId, Points, ProductId};

/// Where the external points debit for an order stands.
///
/// The order row is written before the ledger is debited, so every order
/// starts out `Pending` and is marked with the debit outcome afterwards.
/// `Unknown` means the debit request timed out or returned an ambiguous
/// response; those orders need manual reconciliation against the ledger
/// and are never retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebitStatus {
    /// Order persisted, debit not yet attempted.
    Pending,
    /// Ledger confirmed the withdrawal.
    Debited,
    /// Ledger refused the withdrawal; the buyer kept their points.
    Failed,
    /// Debit outcome could not be determined.
    Unknown,
}

impl DebitStatus {
    /// Database representation of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Debited => "debited",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DebitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DebitStatus {
    type Err = ParseDebitStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "debited" => Ok(Self::Debited),
            "failed" => Ok(Self::Failed),
            "unknown" => Ok(Self::Unknown),
            other => Err(ParseDebitStatusError(other.to_string())),
        }
    }
}

/// Error returned when a stored debit status string is unrecognized.
#[derive(Debug, thiserror::Error)]
#[error("unrecognized debit status: {0}")]
pub struct ParseDebitStatusError(String);

impl sqlx::Type<sqlx::Postgres> for DebitStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for DebitStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(s.parse()?)
    }
}

impl sqlx::Encode<'_, sqlx::Postgres> for DebitStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// One line of an order's item snapshot.
///
/// `price` is the unit price the product carried at checkout time. Line
/// cost is `price * quantity`; the order's `total_cost` is the sum of
/// line costs, so snapshot and total always agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product that was ordered.
    pub product_id: ProductId,
    /// Product name at checkout time.
    pub name: String,
    /// Units ordered.
    pub quantity: i32,
    /// Unit price in points at checkout time.
    pub price: Points,
}

impl OrderItem {
    /// Points charged for this line.
    #[must_use]
    pub const fn line_cost(&self) -> Points {
        self.price.saturating_mul(self.quantity as i64)
    }
}

/// A placed order.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Account that placed the order.
    pub account_id: AccountId,
    /// Buyer's display name at checkout time.
    pub user_name: String,
    /// Buyer's email at checkout time.
    pub email: Email,
    /// Snapshot of the ordered items.
    pub items: Json<Vec<OrderItem>>,
    /// Total points charged.
    pub total_cost: Points,
    /// Outcome of the external points debit.
    pub debit_status: DebitStatus,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_status_round_trips_through_str() {
        for status in [
            DebitStatus::Pending,
            DebitStatus::Debited,
            DebitStatus::Failed,
            DebitStatus::Unknown,
        ] {
            let parsed: DebitStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_debit_status_rejects_unrecognized() {
        assert!("refunded".parse::<DebitStatus>().is_err());
        assert!("PENDING".parse::<DebitStatus>().is_err());
    }

    #[test]
    fn test_debit_status_serializes_lowercase() {
        let json = serde_json::to_string(&DebitStatus::Debited).unwrap();
        assert_eq!(json, "\"debited\"");
    }

    #[test]
    fn test_order_item_snapshot_shape() {
        let item = OrderItem {
            product_id: ProductId::new(42),
            name: "Branded cap".to_string(),
            quantity: 2,
            price: Points::new(700),
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "product_id": 42,
                "name": "Branded cap",
                "quantity": 2,
                "price": 700,
            })
        );
    }
}
