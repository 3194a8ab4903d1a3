//! Domain and wire types for the rewards ledger.

use serde::Deserialize;

use perkstore_core::{Email, Points};

// =============================================================================
// Domain types
// =============================================================================

/// An employee as listed in the ledger directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryUser {
    /// Opaque user ID the ledger uses in balance and debit calls.
    pub ledger_user_id: String,
    /// Work email address, normalized to lowercase.
    pub email: Email,
    /// First name, empty when the directory omits it.
    pub first_name: String,
    /// Last name, empty when the directory omits it.
    pub last_name: String,
}

/// Result of a balance query.
///
/// Balance reads never error; a ledger outage yields `Unavailable` so the
/// caller can tell "zero points" from "could not ask". Checkout must
/// abort on `Unavailable`, display surfaces may degrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceReading {
    /// The ledger reported a balance.
    Known(Points),
    /// The balance could not be determined.
    Unavailable {
        /// Human-readable cause, for logs.
        reason: String,
    },
}

impl BalanceReading {
    /// Collapse to a displayable number, treating `Unavailable` as zero.
    ///
    /// Only for display surfaces. Checkout must match on the reading
    /// instead; an outage shown as a zero balance is cosmetic, an outage
    /// spent as one is not.
    #[must_use]
    pub const fn points_or_zero(&self) -> Points {
        match self {
            Self::Known(points) => *points,
            Self::Unavailable { .. } => Points::ZERO,
        }
    }
}

/// Result of a withdrawal request.
///
/// `Declined` means the debit definitely did not happen (the buyer kept
/// their points). `Unknown` means the request may have landed; such
/// debits are never retried and must be reconciled manually against the
/// ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebitOutcome {
    /// Ledger confirmed the withdrawal.
    Debited,
    /// Ledger refused the withdrawal, or it was never delivered.
    Declined {
        /// Human-readable cause, for logs.
        reason: String,
    },
    /// The withdrawal outcome could not be determined.
    Unknown {
        /// Human-readable cause, for logs.
        reason: String,
    },
}

// =============================================================================
// Wire types
// =============================================================================

/// A value that the ledger serializes as either a single object or an
/// array, depending on how many there are.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// Multiple values.
    Many(Vec<T>),
    /// A single bare value.
    One(T),
}

impl<T> OneOrMany<T> {
    /// Flatten into a vector.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

/// Response from `POST /api/v3/token`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for subsequent calls.
    pub access_token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

/// One name/value pair in a directory profile.
#[derive(Debug, Deserialize)]
pub struct ProfileField {
    /// Field name, e.g. `EMAIL`, `FIRST_NAME`, `LAST_NAME`.
    pub name: String,
    /// Field value.
    pub value: Option<String>,
}

/// One employee profile from the directory listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Opaque ledger user ID.
    pub user_id: String,
    /// Profile fields; a single object when the profile has one field.
    pub fields: Option<OneOrMany<ProfileField>>,
}

/// Response from `POST /api/v2/user/list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    /// Profiles on this page; a single object when the page has one.
    pub user_profiles: Option<OneOrMany<UserProfile>>,
}

impl UserProfile {
    /// Look up a field value by name.
    fn field(&self, name: &str) -> Option<&str> {
        let fields = self.fields.as_ref()?;
        let found = match fields {
            OneOrMany::Many(items) => items.iter().find(|f| f.name == name),
            OneOrMany::One(item) => (item.name == name).then_some(item),
        };
        found.and_then(|f| f.value.as_deref())
    }

    /// Convert into a [`DirectoryUser`].
    ///
    /// Returns `None` when the profile has no parseable email; such
    /// profiles can never match a login and are skipped.
    pub fn into_directory_user(self) -> Option<DirectoryUser> {
        let email = Email::parse(self.field("EMAIL")?).ok()?;
        let first_name = self.field("FIRST_NAME").unwrap_or_default().to_string();
        let last_name = self.field("LAST_NAME").unwrap_or_default().to_string();

        Some(DirectoryUser {
            ledger_user_id: self.user_id,
            email,
            first_name,
            last_name,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_list_parses_array_profiles() {
        let json = r#"{
            "userProfiles": [
                {
                    "userId": "u-1",
                    "fields": [
                        {"name": "EMAIL", "value": "a@example.com"},
                        {"name": "FIRST_NAME", "value": "Anna"},
                        {"name": "LAST_NAME", "value": "Smirnova"}
                    ]
                },
                {
                    "userId": "u-2",
                    "fields": [
                        {"name": "EMAIL", "value": "b@example.com"}
                    ]
                }
            ],
            "totalUsersNumber": 2
        }"#;

        let parsed: UserListResponse = serde_json::from_str(json).unwrap();
        let profiles = parsed.user_profiles.unwrap().into_vec();
        assert_eq!(profiles.len(), 2);
    }

    #[test]
    fn test_user_list_parses_single_bare_profile() {
        // A one-user page arrives as a bare object, not a one-element array.
        let json = r#"{
            "userProfiles": {
                "userId": "u-1",
                "fields": {"name": "EMAIL", "value": "solo@example.com"}
            }
        }"#;

        let parsed: UserListResponse = serde_json::from_str(json).unwrap();
        let profiles = parsed.user_profiles.unwrap().into_vec();
        assert_eq!(profiles.len(), 1);

        let user = profiles
            .into_iter()
            .next()
            .unwrap()
            .into_directory_user()
            .unwrap();
        assert_eq!(user.email.as_str(), "solo@example.com");
        assert_eq!(user.first_name, "");
    }

    #[test]
    fn test_user_list_tolerates_missing_profiles() {
        let parsed: UserListResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.user_profiles.is_none());
    }

    #[test]
    fn test_directory_user_normalizes_email_case() {
        let json = r#"{
            "userId": "u-9",
            "fields": [
                {"name": "EMAIL", "value": "Mixed.Case@Example.COM"},
                {"name": "FIRST_NAME", "value": "Pat"},
                {"name": "LAST_NAME", "value": "Lee"}
            ]
        }"#;

        let profile: UserProfile = serde_json::from_str(json).unwrap();
        let user = profile.into_directory_user().unwrap();
        assert_eq!(user.email.as_str(), "mixed.case@example.com");
    }

    #[test]
    fn test_profile_without_email_is_skipped() {
        let json = r#"{
            "userId": "u-3",
            "fields": [{"name": "FIRST_NAME", "value": "Ghost"}]
        }"#;

        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert!(profile.into_directory_user().is_none());
    }

    #[test]
    fn test_profile_with_null_field_value() {
        let json = r#"{
            "userId": "u-4",
            "fields": [
                {"name": "EMAIL", "value": "x@example.com"},
                {"name": "FIRST_NAME", "value": null}
            ]
        }"#;

        let profile: UserProfile = serde_json::from_str(json).unwrap();
        let user = profile.into_directory_user().unwrap();
        assert_eq!(user.first_name, "");
    }
}
