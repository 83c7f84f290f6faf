//! Password reset: forgot-password requests and token consumption.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};

use super::error::AuthError;
use super::password::hash_password;
use super::state::AuthState;
use super::storage::{
    ResetOutcome, consume_reset_token, lookup_account_by_email, replace_reset_token,
};
use super::types::{ForgotPasswordRequest, MessageResponse, ResetPasswordRequest};
use super::utils::{build_reset_link, hash_token, normalize_email, valid_email, validate_password};

const FORGOT_PASSWORD_MESSAGE: &str = "If this email exists, a reset link has been sent.";

#[utoipa::path(
    post,
    path = "/v1/auth/password/forgot",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset requested; response is identical whether or not the email exists", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let request: ForgotPasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => return Err(AuthError::Validation("Missing payload".to_string())),
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }

    // Unknown emails get the same response with no side effects, so the
    // endpoint cannot be used to enumerate accounts.
    if let Some(account) = lookup_account_by_email(&pool, &email).await? {
        let (token, _expires_at) = replace_reset_token(
            &pool,
            account.id,
            auth_state.config().reset_token_ttl_seconds(),
        )
        .await?;

        let reset_link = build_reset_link(auth_state.config().app_scheme(), &token);
        info!(account_id = account.id, "password reset requested");

        // Unlike the welcome email, a lost reset email leaves the user stuck;
        // delivery failure must surface to the caller.
        auth_state
            .mailer()
            .send_reset_email(&account.email, &account.name, &reset_link)
            .await?;
    } else {
        debug!("password reset requested for unknown email");
    }

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: FORGOT_PASSWORD_MESSAGE.to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/auth/password/reset",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset; every session for the account is revoked", body = MessageResponse),
        (status = 400, description = "Invalid, already used, or expired reset token", body = String)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    pool: Extension<PgPool>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let request: ResetPasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => return Err(AuthError::Validation("Missing payload".to_string())),
    };

    validate_password(&request.new_password).map_err(AuthError::Validation)?;

    let token_hash = hash_token(request.token.trim());
    let new_hash = hash_password(&request.new_password)?;

    match consume_reset_token(&pool, &token_hash, &new_hash).await? {
        ResetOutcome::Completed { account_id } => {
            info!(account_id, "password reset completed; all sessions revoked");
            Ok((
                StatusCode::OK,
                Json(MessageResponse {
                    message: "Password reset successfully. Please log in with your new password."
                        .to_string(),
                }),
            ))
        }
        ResetOutcome::Invalid => Err(AuthError::InvalidResetToken),
        ResetOutcome::AlreadyUsed => Err(AuthError::ResetTokenUsed),
        ResetOutcome::Expired => Err(AuthError::ResetTokenExpired),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::Mailer;
    use crate::api::handlers::auth::rate_limit::{LoginRateLimiter, NoopLoginLimiter};
    use crate::api::handlers::auth::state::AuthConfig;
    use anyhow::Result;
    use axum::response::IntoResponse;
    use sqlx::postgres::PgPoolOptions;

    fn auth_state() -> Arc<AuthState> {
        let limiter: Arc<dyn LoginRateLimiter> = Arc::new(NoopLoginLimiter);
        let mailer = Arc::new(Mailer::log(
            "no-reply@custode.dev".to_string(),
            "Custode Team".to_string(),
        ));
        Arc::new(AuthState::new(AuthConfig::new(), limiter, mailer))
    }

    #[tokio::test]
    async fn forgot_password_missing_payload() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = forgot_password(Extension(pool), Extension(auth_state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn forgot_password_rejects_invalid_email() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = forgot_password(
            Extension(pool),
            Extension(auth_state()),
            Some(Json(ForgotPasswordRequest {
                email: "not-an-email".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn reset_password_rejects_weak_replacement() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = reset_password(
            Extension(pool),
            Some(Json(ResetPasswordRequest {
                token: "some-token".to_string(),
                new_password: "short".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
