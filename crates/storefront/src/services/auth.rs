//! Email one-time-code authentication.
//!
//! There are no local passwords. An employee proves ownership of their
//! work email: we check the address against the ledger directory, mail a
//! 6-digit code, and verify it against the copy stored in the session.
//! The code is single-use and expires after 5 minutes.
//!
//! On successful verification the directory profile is resolved again
//! and upserted into `accounts`, so an employee removed from the
//! directory between the two steps cannot mint a session.

use chrono::Utc;
use thiserror::Error;
use tower_sessions::Session;

use perkstore_core::Email;

use crate::db::{AccountRepository, RepositoryError};
use crate::ledger::{BalanceReading, DirectoryUser, LedgerError};
use crate::middleware::auth::set_current_account;
use crate::models::{Account, CurrentAccount, session::keys};
use crate::services::email::{EmailError, generate_verification_code};
use crate::state::AppState;

/// How long a sign-in code stays valid.
const CODE_TTL_MINUTES: i64 = 5;

/// Errors that can occur during sign-in.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] perkstore_core::EmailError),

    /// The address is not in the ledger employee directory.
    #[error("no employee found with this email")]
    NotInDirectory,

    /// No code was requested in this session, or it was for a different
    /// address.
    #[error("no login in progress")]
    NoPendingLogin,

    /// The stored code is past its expiry.
    #[error("verification code has expired")]
    CodeExpired,

    /// The submitted code does not match the stored one.
    #[error("verification code mismatch")]
    CodeMismatch,

    /// Directory lookup against the ledger failed.
    #[error("directory error: {0}")]
    Directory(#[from] LedgerError),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// Session store error.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The code email could not be delivered.
    #[error("delivery error: {0}")]
    Delivery(#[from] EmailError),
}

/// A completed sign-in.
#[derive(Debug)]
pub struct VerifiedLogin {
    /// The upserted local account.
    pub account: Account,
    /// Points balance read after sign-in. May be unavailable; the login
    /// itself does not depend on it.
    pub balance: BalanceReading,
}

/// Email one-time-code authentication service.
pub struct AuthService<'a> {
    state: &'a AppState,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Look up an email address in the ledger employee directory.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotInDirectory` if no employee has this
    /// address, `AuthError::InvalidEmail` for a malformed address, and
    /// `AuthError::Directory` if the ledger cannot be reached.
    pub async fn check_email(&self, raw_email: &str) -> Result<DirectoryUser, AuthError> {
        let email = Email::parse(raw_email)?;

        self.state
            .ledger()
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::NotInDirectory)
    }

    /// Generate a sign-in code, store it in the session, and email it.
    ///
    /// Only directory members can request a code. Without a configured
    /// email service the code is logged instead of sent, which is how
    /// local development works.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotInDirectory` for unknown addresses and
    /// `AuthError::Delivery` if the email cannot be sent.
    pub async fn send_code(&self, session: &Session, raw_email: &str) -> Result<(), AuthError> {
        let email = Email::parse(raw_email)?;

        if self
            .state
            .ledger()
            .find_user_by_email(&email)
            .await?
            .is_none()
        {
            return Err(AuthError::NotInDirectory);
        }

        let code = generate_verification_code();
        let expires_at = Utc::now() + chrono::Duration::minutes(CODE_TTL_MINUTES);

        session.insert(keys::LOGIN_CODE, &code).await?;
        session.insert(keys::LOGIN_EMAIL, &email).await?;
        session
            .insert(keys::LOGIN_CODE_EXPIRES, expires_at.timestamp())
            .await?;

        if let Some(email_service) = self.state.email_service() {
            email_service.send_login_code(email.as_str(), &code).await?;
        } else {
            // Development mode - log the code
            tracing::warn!(
                email = %email,
                code = %code,
                "SMTP not configured - sign-in code logged (dev mode)"
            );
        }

        Ok(())
    }

    /// Verify a sign-in code and establish the session.
    ///
    /// The code is single-use: it is removed from the session before the
    /// directory is consulted, so a second submission with the same code
    /// fails regardless of outcome.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NoPendingLogin` if this session has no stored
    /// code for this address, `AuthError::CodeExpired` or
    /// `AuthError::CodeMismatch` for a bad code, and
    /// `AuthError::NotInDirectory` if the employee disappeared from the
    /// directory since the code was sent.
    pub async fn verify_code(
        &self,
        session: &Session,
        raw_email: &str,
        code: &str,
    ) -> Result<VerifiedLogin, AuthError> {
        let email = Email::parse(raw_email)?;

        let stored_code: String = session
            .get(keys::LOGIN_CODE)
            .await?
            .ok_or(AuthError::NoPendingLogin)?;
        let stored_email: Email = session
            .get(keys::LOGIN_EMAIL)
            .await?
            .ok_or(AuthError::NoPendingLogin)?;
        let expires_timestamp: i64 = session
            .get(keys::LOGIN_CODE_EXPIRES)
            .await?
            .ok_or(AuthError::NoPendingLogin)?;

        // The code only proves ownership of the address it was sent to.
        if stored_email != email {
            return Err(AuthError::NoPendingLogin);
        }

        if Utc::now().timestamp() > expires_timestamp {
            let _ = session.remove::<String>(keys::LOGIN_CODE).await;
            return Err(AuthError::CodeExpired);
        }

        if code.trim() != stored_code {
            return Err(AuthError::CodeMismatch);
        }

        // One-time use
        let _ = session.remove::<String>(keys::LOGIN_CODE).await;
        let _ = session.remove::<Email>(keys::LOGIN_EMAIL).await;
        let _ = session.remove::<i64>(keys::LOGIN_CODE_EXPIRES).await;

        let user = self
            .state
            .ledger()
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::NotInDirectory)?;

        let account = AccountRepository::new(self.state.pool())
            .upsert(
                &user.ledger_user_id,
                &user.email,
                &user.first_name,
                &user.last_name,
            )
            .await?;

        set_current_account(
            session,
            &CurrentAccount {
                id: account.id,
                email: account.email.clone(),
            },
        )
        .await?;

        tracing::info!(account_id = %account.id, "Employee signed in");

        let balance = self.state.ledger().get_balance(&user.ledger_user_id).await;

        Ok(VerifiedLogin { account, balance })
    }
}
