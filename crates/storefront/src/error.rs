//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::ledger::LedgerError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Rewards ledger operation failed.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order placement failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body returned to clients.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    /// Whether this error is server-class and should reach Sentry.
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Ledger(_) | Self::Internal(_) => true,
            Self::Auth(err) => matches!(
                err,
                AuthError::Directory(_) | AuthError::Database(_) | AuthError::Session(_)
            ),
            Self::Checkout(err) => matches!(
                err,
                CheckoutError::LedgerUnavailable { .. }
                    | CheckoutError::PersistenceError(_)
                    | CheckoutError::DebitFailed { .. }
            ),
            _ => false,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Ledger(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(err) => match err {
                AuthError::NotInDirectory => StatusCode::NOT_FOUND,
                AuthError::NoPendingLogin | AuthError::CodeExpired | AuthError::CodeMismatch => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Directory(_) => StatusCode::BAD_GATEWAY,
                AuthError::Database(_) | AuthError::Session(_) | AuthError::Delivery(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::Unauthorized => StatusCode::UNAUTHORIZED,
                CheckoutError::EmptyCart
                | CheckoutError::InsufficientStock { .. }
                | CheckoutError::InsufficientPoints { .. } => StatusCode::BAD_REQUEST,
                CheckoutError::LedgerUnavailable { .. } | CheckoutError::DebitFailed { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                CheckoutError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-safe message. Internal details stay in logs and Sentry.
    fn client_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Ledger(_) => "Points service is unavailable".to_string(),
            Self::Auth(err) => match err {
                AuthError::NotInDirectory => "No employee found with this email".to_string(),
                AuthError::NoPendingLogin => {
                    "No login in progress. Please request a new code.".to_string()
                }
                AuthError::CodeExpired => {
                    "Verification code has expired. Please request a new code.".to_string()
                }
                AuthError::CodeMismatch => "Invalid verification code".to_string(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::Directory(_) => "Points service is unavailable".to_string(),
                AuthError::Delivery(_) => {
                    "Failed to send verification email. Please try again.".to_string()
                }
                AuthError::Database(_) | AuthError::Session(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::Unauthorized => "Authentication required".to_string(),
                CheckoutError::EmptyCart => "Your cart is empty".to_string(),
                CheckoutError::InsufficientStock {
                    product, available, ..
                } => {
                    format!("Not enough stock for \"{product}\". Available: {available}")
                }
                CheckoutError::InsufficientPoints {
                    required,
                    available,
                } => {
                    format!("Not enough points. Required: {required}, you have {available}")
                }
                CheckoutError::LedgerUnavailable { .. } => {
                    "Points balance is unavailable right now. Your order was not placed."
                        .to_string()
                }
                CheckoutError::PersistenceError(_) => {
                    "Failed to place the order. Nothing was charged.".to_string()
                }
                CheckoutError::DebitFailed { .. } => {
                    "Your order was recorded but the points withdrawal did not complete. \
                     Support has been notified."
                        .to_string()
                }
            },
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status_code();
        let body = ErrorBody {
            error: self.client_message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an account ID.
///
/// Call this after successful authentication to associate errors with accounts.
pub fn set_sentry_user(account_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(account_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the account.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Order persisted", Some(&[("order_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::DebitOutcome;
    use perkstore_core::Points;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_checkout_precondition_failures_are_bad_request() {
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::EmptyCart)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::InsufficientStock {
                product: "Mug".to_string(),
                requested: 3,
                available: 1,
            })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::InsufficientPoints {
                required: Points::new(500),
                available: Points::new(120),
            })),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_ledger_failures_are_bad_gateway() {
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::LedgerUnavailable {
                reason: "timeout".to_string(),
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::DebitFailed {
                order_id: perkstore_core::OrderId::new(1),
                outcome: DebitOutcome::Declined {
                    reason: "HTTP 403".to_string(),
                },
            })),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_debit_failure_never_reads_as_success() {
        // The client-facing message must say the withdrawal failed even
        // though the order row was kept.
        let err = AppError::Checkout(CheckoutError::DebitFailed {
            order_id: perkstore_core::OrderId::new(7),
            outcome: DebitOutcome::Unknown {
                reason: "timed out".to_string(),
            },
        });
        assert!(err.client_message().contains("did not complete"));
    }

    #[test]
    fn test_insufficient_stock_message_names_product() {
        let err = AppError::Checkout(CheckoutError::InsufficientStock {
            product: "Thermo mug".to_string(),
            requested: 5,
            available: 2,
        });
        let msg = err.client_message();
        assert!(msg.contains("Thermo mug"));
        assert!(msg.contains('2'));
    }

    #[test]
    fn test_internal_details_are_redacted() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "secret table broke".to_string(),
        ));
        assert_eq!(err.client_message(), "Internal server error");
    }
}
