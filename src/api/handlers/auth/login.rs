//! Password login with lockout and transparent legacy-secret upgrade.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};

use super::error::AuthError;
use super::password::{StoredSecret, hash_password, verify_password};
use super::state::AuthState;
use super::storage::{
    AccountRecord, insert_session, lookup_account_by_email, update_account_password,
};
use super::types::{AccountResponse, AuthResponse, LoginRequest};
use super::utils::normalize_email;

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = String),
        (status = 429, description = "Too many failed attempts", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return Err(AuthError::Validation("Missing payload".to_string())),
    };

    let email = normalize_email(&request.email);

    let limiter = auth_state.rate_limiter();
    if limiter.is_locked(&email) {
        return Err(AuthError::RateLimited {
            remaining_seconds: limiter.remaining_lockout_seconds(&email),
        });
    }

    // An unknown email still counts as a failed attempt so that response
    // shape and lockout behavior cannot be used to probe for accounts.
    let Some(account) = lookup_account_by_email(&pool, &email).await? else {
        debug!("login attempt for unknown email");
        limiter.record_failure(&email);
        return Err(AuthError::InvalidCredentials);
    };

    if !check_password(&pool, &account, &request.password).await? {
        limiter.record_failure(&email);
        return Err(AuthError::InvalidCredentials);
    }

    limiter.clear(&email);
    info!(account_id = account.id, "login successful");

    let (token, _expires_at) =
        insert_session(&pool, account.id, auth_state.config().session_ttl_seconds()).await?;

    let response = AuthResponse {
        message: "Login successful".to_string(),
        token,
        account: AccountResponse {
            id: account.id,
            name: account.name,
            email: account.email,
            phone: account.phone,
            date_of_birth: account.date_of_birth,
        },
    };
    Ok((StatusCode::OK, Json(response)))
}

/// Verify the candidate password, upgrading legacy plaintext rows in place.
///
/// A legacy secret that matches is rehashed with Argon2id before the login
/// completes, so the plaintext value only survives until the first successful
/// login.
async fn check_password(
    pool: &PgPool,
    account: &AccountRecord,
    candidate: &str,
) -> Result<bool, AuthError> {
    match StoredSecret::parse(&account.password) {
        StoredSecret::Hashed(hash) => Ok(verify_password(candidate, &hash)),
        StoredSecret::Legacy(stored) => {
            if stored != candidate {
                return Ok(false);
            }
            info!(account_id = account.id, "upgrading legacy password to Argon2id");
            let new_hash = hash_password(candidate)?;
            update_account_password(pool, account.id, &new_hash).await?;
            Ok(true)
        }
    }
}
