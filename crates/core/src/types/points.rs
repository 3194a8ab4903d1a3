//! Point amount type.
//!
//! All prices and balances in the shop are denominated in whole reward
//! points. The external ledger reports and debits plain integers, so there
//! is no fractional unit and no currency code.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A non-fractional amount of reward points.
///
/// Used for product prices, cart line costs, order totals, and ledger
/// balances. Arithmetic is saturating: point amounts are bounded by catalog
/// prices and employee balances, and a saturated value is still ordered
/// correctly for the comparisons the checkout path performs.
///
/// ```
/// use perkstore_core::Points;
///
/// let unit = Points::new(150);
/// let line = unit.saturating_mul(3);
/// assert_eq!(line, Points::new(450));
/// assert!(Points::new(500) >= line);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Points(i64);

impl Points {
    /// Zero points.
    pub const ZERO: Self = Self(0);

    /// Create an amount from a raw point count.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the underlying point count.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Whether this amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Saturating addition of two amounts.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction, clamped at zero for display purposes.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        let diff = self.0.saturating_sub(other.0);
        if diff < 0 { Self(0) } else { Self(diff) }
    }

    /// Saturating multiplication by a line quantity.
    #[must_use]
    pub const fn saturating_mul(self, quantity: i64) -> Self {
        Self(self.0.saturating_mul(quantity))
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Points {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl From<Points> for i64 {
    fn from(amount: Points) -> Self {
        amount.0
    }
}

// SQLx support (with postgres feature): stored as BIGINT
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Points {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Points {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Points {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_cost() {
        assert_eq!(Points::new(150).saturating_mul(4), Points::new(600));
    }

    #[test]
    fn test_total_accumulation() {
        let total = [Points::new(100), Points::new(250), Points::new(50)]
            .into_iter()
            .fold(Points::ZERO, Points::saturating_add);
        assert_eq!(total, Points::new(400));
    }

    #[test]
    fn test_balance_comparison() {
        assert!(Points::new(500) >= Points::new(500));
        assert!(Points::new(499) < Points::new(500));
    }

    #[test]
    fn test_remaining_clamps_at_zero() {
        assert_eq!(
            Points::new(100).saturating_sub(Points::new(250)),
            Points::ZERO
        );
        assert_eq!(
            Points::new(250).saturating_sub(Points::new(100)),
            Points::new(150)
        );
    }

    #[test]
    fn test_serde_transparent() {
        let amount = Points::new(1234);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "1234");
        let back: Points = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }
}
