//! Account route handlers.
//!
//! All routes here require authentication. Profile data is re-read
//! from the database on each call rather than trusted from the
//! session, so a deleted account stops resolving immediately.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use perkstore_core::Email;

use crate::db::{AccountRepository, AdminRepository};
use crate::error::AppError;
use crate::ledger::BalanceReading;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Profile response.
#[derive(Debug, Serialize)]
pub struct AccountInfoResponse {
    pub email: Email,
    pub name: String,
}

/// Points balance response.
#[derive(Debug, Serialize)]
pub struct PointsResponse {
    pub points: i64,
}

/// Admin flag response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsAdminResponse {
    pub is_admin: bool,
    pub email: Email,
}

/// Return the signed-in account's profile.
///
/// GET /api/account/info
#[instrument(skip(state, current), fields(account_id = %current.id))]
pub async fn account_info(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<AccountInfoResponse>, AppError> {
    let account = AccountRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    let name = account.display_name();

    Ok(Json(AccountInfoResponse {
        email: account.email,
        name,
    }))
}

/// Return the signed-in account's live points balance.
///
/// GET /api/account/points
///
/// A ledger outage reads as zero here so the page still renders; the
/// checkout path treats the same outage as a hard failure.
#[instrument(skip(state, current), fields(account_id = %current.id))]
pub async fn account_points(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<PointsResponse>, AppError> {
    let account = AccountRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    let balance = state.ledger().get_balance(&account.ledger_user_id).await;
    if let BalanceReading::Unavailable { reason } = &balance {
        tracing::warn!(%reason, "Points balance unavailable, showing zero");
    }

    Ok(Json(PointsResponse {
        points: balance.points_or_zero().as_i64(),
    }))
}

/// Report whether the signed-in account is an admin.
///
/// GET /api/account/is-admin
#[instrument(skip(state, current), fields(account_id = %current.id))]
pub async fn is_admin(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<IsAdminResponse>, AppError> {
    let is_admin = AdminRepository::new(state.pool())
        .is_admin(&current.email)
        .await?;

    Ok(Json(IsAdminResponse {
        is_admin,
        email: current.email,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_admin_response_uses_camel_case() {
        let json = serde_json::to_value(IsAdminResponse {
            is_admin: true,
            email: Email::parse("ops@example.com").unwrap(),
        })
        .unwrap();

        assert_eq!(json["isAdmin"], true);
        assert_eq!(json["email"], "ops@example.com");
        assert!(json.get("is_admin").is_none());
    }
}
