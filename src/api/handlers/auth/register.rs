//! Account registration.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

use super::error::AuthError;
use super::password::hash_password;
use super::state::AuthState;
use super::storage::{InsertAccountOutcome, insert_account, insert_session};
use super::types::{AccountResponse, AuthResponse, RegisterRequest};
use super::utils::{
    normalize_email, valid_email, validate_date_of_birth, validate_name, validate_password,
    validate_phone,
};

fn validate_registration(request: &RegisterRequest, email: &str) -> Result<(), AuthError> {
    if !valid_email(email) {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }
    validate_name(&request.name).map_err(AuthError::Validation)?;
    validate_phone(&request.phone).map_err(AuthError::Validation)?;
    validate_date_of_birth(&request.date_of_birth).map_err(AuthError::Validation)?;
    validate_password(&request.password).map_err(AuthError::Validation)?;
    Ok(())
}

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation failure or email already registered", body = String)
    ),
    tag = "auth"
)]
pub async fn register(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return Err(AuthError::Validation("Missing payload".to_string())),
    };

    let email = normalize_email(&request.email);
    validate_registration(&request, &email)?;

    let name = request.name.trim().to_string();
    let password_hash = hash_password(&request.password)?;

    let account_id = match insert_account(
        &pool,
        &name,
        &email,
        &request.phone,
        &request.date_of_birth,
        &password_hash,
    )
    .await?
    {
        InsertAccountOutcome::Created(account_id) => account_id,
        InsertAccountOutcome::EmailTaken => return Err(AuthError::EmailTaken),
    };

    info!(account_id, "account created");

    let (token, _expires_at) =
        insert_session(&pool, account_id, auth_state.config().session_ttl_seconds()).await?;

    // Welcome email is best-effort: registration must not fail (or block)
    // because the mail provider is down.
    let mailer = Arc::clone(auth_state.mailer());
    let (welcome_email, welcome_name) = (email.clone(), name.clone());
    tokio::spawn(async move {
        if let Err(err) = mailer.send_welcome_email(&welcome_email, &welcome_name).await {
            warn!("Failed to send welcome email: {err}");
        }
    });

    let response = AuthResponse {
        message: "Account created successfully".to_string(),
        token,
        account: AccountResponse {
            id: account_id,
            name,
            email,
            phone: request.phone,
            date_of_birth: request.date_of_birth,
        },
    };
    Ok((StatusCode::CREATED, Json(response)))
}
