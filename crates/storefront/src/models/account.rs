//! Storefront account types.
//!
//! Accounts mirror users from the external rewards ledger directory. They
//! are created on first successful login and carry no point balance; the
//! ledger stays the source of truth for points.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use perkstore_core::{AccountId, Email};

/// A storefront account backed by a ledger directory user.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Account {
    /// Unique account ID.
    pub id: AccountId,
    /// Opaque user ID in the external rewards ledger.
    pub ledger_user_id: String,
    /// Work email address, lowercased.
    pub email: Email,
    /// First name as reported by the ledger directory.
    pub first_name: String,
    /// Last name as reported by the ledger directory.
    pub last_name: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Full display name, "First Last".
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_display_name_joins_first_and_last() {
        let account = Account {
            id: AccountId::new(Uuid::nil()),
            ledger_user_id: "abc123".to_string(),
            email: Email::parse("ivan.petrov@example.com").unwrap(),
            first_name: "Ivan".to_string(),
            last_name: "Petrov".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(account.display_name(), "Ivan Petrov");
    }
}
