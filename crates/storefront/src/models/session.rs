//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use perkstore_core::{AccountId, Email};

/// Session-stored account identity.
///
/// Minimal data stored in the session to identify the logged-in account.
/// Everything else (name, ledger user ID) is loaded from `accounts` when
/// a handler needs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAccount {
    /// Account's database ID.
    pub id: AccountId,
    /// Account's email address.
    pub email: Email,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in account.
    pub const CURRENT_ACCOUNT: &str = "current_account";

    /// Key for the pending login verification code.
    pub const LOGIN_CODE: &str = "login_code";

    /// Key for the email the pending login code was sent to.
    pub const LOGIN_EMAIL: &str = "login_email";

    /// Key for the login code expiry (unix timestamp).
    pub const LOGIN_CODE_EXPIRES: &str = "login_code_expires";
}
