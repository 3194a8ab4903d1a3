//! External rewards ledger client.
//!
//! # Architecture
//!
//! - The ledger is the source of truth for point balances - NO local
//!   balance column, every read and debit goes to the ledger live
//! - OAuth2 client-credentials token, cached in-process with a safety
//!   margin before expiry
//! - Employee directory listing cached via `moka` (5 minute TTL)
//!
//! # APIs
//!
//! The ledger exposes three surfaces on two hosts:
//!
//! ## Account host (`https://{account_domain}`)
//! - `POST /api/v3/token` - client-credentials token (form encoded)
//!
//! ## Directory host (`https://{api_domain}`)
//! - `POST /api/v2/user/list` - paginated employee directory (JSON,
//!   `Bearer` auth)
//!
//! ## Gamification host (`https://api-{api_domain}`)
//! - `GET /gamification/points?userIds={id}` - balance (XML, bare token)
//! - `POST /gamification/points/withdraw` - debit (XML, bare token)
//!
//! The gamification endpoints authenticate with the raw token value and
//! speak XML; sending `Bearer` or JSON there gets a 401. This mirrors
//! the vendor's API exactly.
//!
//! # Failure shape
//!
//! Directory and token failures are hard errors ([`LedgerError`]).
//! Balance reads return a tagged [`BalanceReading`] instead of erroring,
//! and debits return a [`DebitOutcome`] that distinguishes "definitely
//! not taken" from "outcome unknown". Callers decide what each means for
//! them; the client never collapses an ambiguous debit into a success or
//! a failure.

mod client;
mod token;
pub mod types;

pub use client::LedgerClient;
pub use token::TokenCache;
pub use types::{BalanceReading, DebitOutcome, DirectoryUser};

use thiserror::Error;

/// Errors that can occur when interacting with the rewards ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Ledger returned a non-success status.
    #[error("ledger API error ({status}): {message}")]
    Api {
        /// HTTP status returned by the ledger.
        status: u16,
        /// Response body, truncated for logging.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_display() {
        let err = LedgerError::Api {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "ledger API error (503): maintenance");
    }
}
