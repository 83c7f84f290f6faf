//! Authenticated account endpoints.
//!
//! Flow Overview:
//! 1) Authenticate via the bearer session token.
//! 2) Resolve the target account row.
//! 3) Apply allow-listed updates or deletion, self-service only.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::error;
use utoipa::ToSchema;

use super::auth::session::require_account;
use super::auth::types::{AccountResponse, MessageResponse};
use super::auth::{AccountProfile, delete_account, fetch_account_profile, update_account_profile};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AccountUpdateRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

fn profile_response(profile: AccountProfile) -> AccountResponse {
    AccountResponse {
        id: profile.id,
        name: profile.name,
        email: profile.email,
        phone: profile.phone,
        date_of_birth: profile.date_of_birth,
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[utoipa::path(
    get,
    path = "/v1/accounts/me",
    responses(
        (status = 200, description = "Return the authenticated account.", body = AccountResponse),
        (status = 401, description = "Missing or invalid bearer token."),
        (status = 404, description = "Account no longer exists.")
    ),
    tag = "accounts"
)]
pub async fn get_me(headers: HeaderMap, pool: Extension<PgPool>) -> impl IntoResponse {
    let account_id = match require_account(&headers, &pool).await {
        Ok(account_id) => account_id,
        Err(err) => return err.into_response(),
    };

    match fetch_account_profile(&pool, account_id).await {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile_response(profile))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Account not found").into_response(),
        Err(err) => {
            error!("Failed to fetch account: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    patch,
    path = "/v1/accounts/me",
    request_body = AccountUpdateRequest,
    responses(
        (status = 200, description = "Account updated.", body = AccountResponse),
        (status = 400, description = "No updates provided."),
        (status = 401, description = "Missing or invalid bearer token.")
    ),
    tag = "accounts"
)]
pub async fn patch_me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    payload: Option<Json<AccountUpdateRequest>>,
) -> impl IntoResponse {
    let account_id = match require_account(&headers, &pool).await {
        Ok(account_id) => account_id,
        Err(err) => return err.into_response(),
    };

    let (name, phone) = match payload {
        Some(Json(request)) => (
            normalize_optional(request.name),
            normalize_optional(request.phone),
        ),
        None => (None, None),
    };

    if name.is_none() && phone.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            "Provide at least one field to update (name or phone)",
        )
            .into_response();
    }

    match update_account_profile(&pool, account_id, name.as_deref(), phone.as_deref()).await {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile_response(profile))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Account not found").into_response(),
        Err(err) => {
            error!("Failed to update account: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/accounts/{account_id}",
    params(
        ("account_id" = i64, Path, description = "Account identifier")
    ),
    responses(
        (status = 200, description = "Return the requested account.", body = AccountResponse),
        (status = 401, description = "Missing or invalid bearer token."),
        (status = 403, description = "Accounts are visible to their owner only."),
        (status = 404, description = "Account not found.")
    ),
    tag = "accounts"
)]
pub async fn get_account(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    Path(account_id): Path<i64>,
) -> impl IntoResponse {
    let current_account_id = match require_account(&headers, &pool).await {
        Ok(account_id) => account_id,
        Err(err) => return err.into_response(),
    };

    if account_id != current_account_id {
        return (StatusCode::FORBIDDEN, "You can only view your own account").into_response();
    }

    match fetch_account_profile(&pool, account_id).await {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile_response(profile))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Account not found").into_response(),
        Err(err) => {
            error!("Failed to fetch account: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/v1/accounts/{account_id}",
    params(
        ("account_id" = i64, Path, description = "Account identifier")
    ),
    responses(
        (status = 200, description = "Account and its sessions deleted.", body = MessageResponse),
        (status = 401, description = "Missing or invalid bearer token."),
        (status = 403, description = "Accounts are deletable by their owner only."),
        (status = 404, description = "Account not found.")
    ),
    tag = "accounts"
)]
pub async fn remove_account(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    Path(account_id): Path<i64>,
) -> impl IntoResponse {
    let current_account_id = match require_account(&headers, &pool).await {
        Ok(account_id) => account_id,
        Err(err) => return err.into_response(),
    };

    if account_id != current_account_id {
        return (StatusCode::FORBIDDEN, "You can only delete your own account").into_response();
    }

    match delete_account(&pool, account_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Account deleted successfully".to_string(),
            }),
        )
            .into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Account not found").into_response(),
        Err(err) => {
            error!("Failed to delete account: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
