//! Authentication route handlers.
//!
//! Email one-time-code sign-in: check the address against the ledger
//! directory, send a code, verify it. All request and response bodies
//! are JSON; the browser client keeps the session cookie.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use perkstore_core::Email;

use crate::error::AppError;
use crate::ledger::DirectoryUser;
use crate::middleware::{OptionalAuth, clear_current_account};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Request carrying just an email address.
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

/// Request to verify a sign-in code.
#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

/// Directory profile returned by the check-email step.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUserDto {
    pub user_id: String,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
}

impl From<DirectoryUser> for DirectoryUserDto {
    fn from(user: DirectoryUser) -> Self {
        Self {
            user_id: user.ledger_user_id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// Response after a successful directory lookup.
#[derive(Debug, Serialize)]
pub struct CheckEmailResponse {
    pub success: bool,
    pub user: DirectoryUserDto,
}

/// Response after a code was sent.
#[derive(Debug, Serialize)]
pub struct SendCodeResponse {
    pub success: bool,
}

/// Signed-in profile returned after code verification.
#[derive(Debug, Serialize)]
pub struct LoginUserDto {
    pub email: Email,
    pub name: String,
    pub points: i64,
}

/// Response after a successful sign-in.
#[derive(Debug, Serialize)]
pub struct VerifyCodeResponse {
    pub success: bool,
    pub user: LoginUserDto,
}

/// Response after logout.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Look up an email in the ledger directory without sending anything.
///
/// POST /api/auth/check-email
pub async fn check_email(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<CheckEmailResponse>, AppError> {
    let user = AuthService::new(&state).check_email(&req.email).await?;

    Ok(Json(CheckEmailResponse {
        success: true,
        user: user.into(),
    }))
}

/// Generate a sign-in code and email it.
///
/// POST /api/auth/send-code
pub async fn send_code(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<EmailRequest>,
) -> Result<Json<SendCodeResponse>, AppError> {
    AuthService::new(&state)
        .send_code(&session, &req.email)
        .await?;

    Ok(Json(SendCodeResponse { success: true }))
}

/// Verify a sign-in code and establish the session.
///
/// POST /api/auth/verify-code
pub async fn verify_code(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<Json<VerifyCodeResponse>, AppError> {
    let login = AuthService::new(&state)
        .verify_code(&session, &req.email, &req.code)
        .await?;

    let name = login.account.display_name();
    let points = login.balance.points_or_zero().as_i64();

    Ok(Json(VerifyCodeResponse {
        success: true,
        user: LoginUserDto {
            email: login.account.email,
            name,
            points,
        },
    }))
}

/// Clear the session identity.
///
/// Succeeds even when nobody is signed in, so stale clients can always
/// reset themselves.
///
/// POST /api/auth/logout
pub async fn logout(
    OptionalAuth(account): OptionalAuth,
    session: Session,
) -> Result<Json<LogoutResponse>, AppError> {
    clear_current_account(&session)
        .await
        .map_err(AuthError::from)?;
    crate::error::clear_sentry_user();

    if let Some(account) = account {
        tracing::info!(email = %account.email, "Account signed out");
    }

    Ok(Json(LogoutResponse { success: true }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_user_dto_uses_camel_case() {
        let dto = DirectoryUserDto {
            user_id: "u-123".to_string(),
            email: Email::parse("jamie@example.com").unwrap(),
            first_name: "Jamie".to_string(),
            last_name: "Fox".to_string(),
        };

        let json = serde_json::to_value(&dto).unwrap();

        assert_eq!(json["userId"], "u-123");
        assert_eq!(json["firstName"], "Jamie");
        assert_eq!(json["lastName"], "Fox");
        assert_eq!(json["email"], "jamie@example.com");
    }
}
