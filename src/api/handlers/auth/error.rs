//! User-facing error taxonomy for the auth flows.
//!
//! Every variant maps to a stable, user-safe message. Internal persistence or
//! delivery failures are logged server-side and surface as a generic 500 so
//! storage details never leak. Login deliberately collapses unknown-email and
//! wrong-password into one message to resist account enumeration.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Too many failed login attempts. Try again in {} minute(s).", .remaining_seconds.div_ceil(60))]
    RateLimited { remaining_seconds: u64 },
    #[error("Invalid or expired token")]
    Unauthorized,
    #[error("Invalid reset token")]
    InvalidResetToken,
    #[error("Reset token has already been used")]
    ResetTokenUsed,
    #[error("Reset token has expired. Please request a new reset link.")]
    ResetTokenExpired,
    #[error("Internal server error")]
    Internal(anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::EmailTaken
            | Self::InvalidResetToken
            | Self::ResetTokenUsed
            | Self::ResetTokenExpired => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let Self::Internal(source) = &self {
            error!("Internal error: {source:#}");
        }
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(AuthError::EmailTaken.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::RateLimited {
                remaining_seconds: 42
            }
            .status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AuthError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn rate_limited_rounds_minutes_up() {
        let err = AuthError::RateLimited {
            remaining_seconds: 61,
        };
        assert_eq!(
            err.to_string(),
            "Too many failed login attempts. Try again in 2 minute(s)."
        );

        let err = AuthError::RateLimited {
            remaining_seconds: 60,
        };
        assert_eq!(
            err.to_string(),
            "Too many failed login attempts. Try again in 1 minute(s)."
        );
    }

    #[test]
    fn reset_failures_have_distinct_messages() {
        let invalid = AuthError::InvalidResetToken.to_string();
        let used = AuthError::ResetTokenUsed.to_string();
        let expired = AuthError::ResetTokenExpired.to_string();
        assert_ne!(invalid, used);
        assert_ne!(used, expired);
        assert_ne!(invalid, expired);
    }

    #[test]
    fn internal_error_hides_the_cause() {
        let err = AuthError::Internal(anyhow::anyhow!("connection refused to db:5432"));
        assert_eq!(err.to_string(), "Internal server error");
    }
}
