//! Auth Error Types
//!
//! Closed set of failures produced by the credential and session core.
//! Every variant is classified into a [`kernel::error::kind::ErrorKind`] and
//! rendered through the unified `kernel::error::AppError` at the HTTP edge.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::lockout::LOCK_DURATION_MINUTES;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Input rejected by a value object or the password policy
    #[error("{0}")]
    Validation(String),

    /// Unknown email or wrong password. Never says which.
    #[error("{}", credentials_message(*.attempts_left))]
    InvalidCredentials { attempts_left: Option<u32> },

    /// Current password did not verify (password change)
    #[error("Current password is incorrect")]
    WrongPassword,

    #[error("Authentication token is missing")]
    TokenMissing,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    TokenInvalid,

    /// Token was valid but its subject no longer exists
    #[error("User no longer exists")]
    UnknownSubject,

    /// Refresh token reuse detected; every session of the user was revoked
    #[error("Session is no longer valid. Please log in again")]
    SessionInvalid,

    #[error("Account is deactivated")]
    AccountDisabled,

    #[error("Password has not been set. Please use your invitation link")]
    PasswordNotSet,

    #[error("Invalid bootstrap secret")]
    BootstrapSecretMismatch,

    #[error("You do not have permission to perform this action")]
    InsufficientRole,

    #[error("Email is already registered")]
    EmailTaken,

    #[error("An admin account already exists")]
    AdminExists,

    #[error("You cannot deactivate your own account")]
    SelfDeactivation,

    #[error("User has already completed onboarding")]
    InvitationNotPending,

    #[error("Account is temporarily locked. Try again in {minutes_remaining} minute(s)")]
    AccountLocked { minutes_remaining: i64 },

    #[error("User not found")]
    UserNotFound,

    /// Same error for wrong and expired invite tokens
    #[error("Invite link is invalid or has expired")]
    InviteInvalidOrExpired,

    #[error("Password reset link is invalid or has expired")]
    ResetTokenInvalidOrExpired,

    /// Optimistic concurrency retries exhausted
    #[error("The account was modified concurrently. Please retry")]
    ConcurrentModification,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn credentials_message(attempts_left: Option<u32>) -> String {
    match attempts_left {
        None => "Invalid email or password".to_string(),
        Some(0) => format!(
            "Invalid email or password. Account locked for {} minutes due to too many failed attempts",
            LOCK_DURATION_MINUTES
        ),
        Some(n) => format!("Invalid email or password. {} attempt(s) remaining", n),
    }
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_)
            | AuthError::InviteInvalidOrExpired
            | AuthError::ResetTokenInvalidOrExpired => ErrorKind::BadRequest,
            AuthError::InvalidCredentials { .. }
            | AuthError::WrongPassword
            | AuthError::TokenMissing
            | AuthError::TokenExpired
            | AuthError::TokenInvalid
            | AuthError::UnknownSubject
            | AuthError::SessionInvalid => ErrorKind::Unauthorized,
            AuthError::AccountDisabled
            | AuthError::PasswordNotSet
            | AuthError::BootstrapSecretMismatch
            | AuthError::InsufficientRole => ErrorKind::Forbidden,
            AuthError::EmailTaken
            | AuthError::AdminExists
            | AuthError::SelfDeactivation
            | AuthError::InvitationNotPending
            | AuthError::ConcurrentModification => ErrorKind::Conflict,
            AuthError::AccountLocked { .. } => ErrorKind::Locked,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Convert to AppError. Server-side failures get an opaque message.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            AuthError::AccountLocked { minutes_remaining } => {
                AppError::new(self.kind(), self.to_string())
                    .with_retry_after((*minutes_remaining).max(0) as u64 * 60)
            }
            AuthError::SessionInvalid => AppError::new(self.kind(), self.to_string())
                .with_action("Sign in again on every device"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::SessionInvalid => {
                tracing::warn!("Rejected request after refresh token reuse");
            }
            AuthError::AccountLocked { .. } => {
                tracing::warn!("Login attempt on locked account");
            }
            AuthError::BootstrapSecretMismatch => {
                tracing::warn!("Admin bootstrap attempted with wrong secret");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => AuthError::Validation(err.message().to_string()),
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        AuthError::Internal(format!("Blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_message() {
        let err = AuthError::InvalidCredentials { attempts_left: None };
        assert_eq!(err.to_string(), "Invalid email or password");

        let err = AuthError::InvalidCredentials {
            attempts_left: Some(3),
        };
        assert!(err.to_string().contains("3 attempt(s) remaining"));

        let err = AuthError::InvalidCredentials {
            attempts_left: Some(0),
        };
        assert!(err.to_string().contains("Account locked for 30 minutes"));
    }

    #[test]
    fn test_classification() {
        assert_eq!(AuthError::SessionInvalid.kind(), ErrorKind::Unauthorized);
        assert_eq!(AuthError::TokenExpired.kind(), ErrorKind::Unauthorized);
        assert_eq!(AuthError::PasswordNotSet.kind(), ErrorKind::Forbidden);
        assert_eq!(AuthError::AdminExists.kind(), ErrorKind::Conflict);
        assert_eq!(AuthError::UserNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(
            AuthError::AccountLocked {
                minutes_remaining: 30
            }
            .status_code(),
            StatusCode::LOCKED
        );
        assert_eq!(
            AuthError::InviteInvalidOrExpired.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_errors_are_opaque() {
        let app = AuthError::Internal("argon2 exploded".to_string()).to_app_error();
        assert_eq!(app.status_code(), 500);
        assert!(!app.message().contains("argon2"));
    }

    #[test]
    fn test_locked_carries_retry_after() {
        let app = AuthError::AccountLocked {
            minutes_remaining: 2,
        }
        .to_app_error();
        assert_eq!(app.retry_after_secs(), Some(120));
    }

    #[test]
    fn test_from_app_error() {
        let err: AuthError = AppError::bad_request("Email cannot be empty").into();
        assert!(matches!(err, AuthError::Validation(ref m) if m == "Email cannot be empty"));

        let err: AuthError = AppError::internal("boom").into();
        assert!(matches!(err, AuthError::Internal(_)));
    }
}
