//! Bearer session validation and logout.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use sqlx::PgPool;
use tracing::error;

use super::error::AuthError;
use super::storage::{delete_session, lookup_session_account};
use super::types::{LogoutRequest, MessageResponse};
use super::utils::hash_token;

/// Resolve the bearer token in `headers` to its owning account id.
///
/// Fails with [`AuthError::Unauthorized`] when the token is missing, unknown,
/// or expired; the three cases are indistinguishable to the caller.
pub(crate) async fn require_account(headers: &HeaderMap, pool: &PgPool) -> Result<i64, AuthError> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(AuthError::Unauthorized);
    };
    // Only the hash is stored; never compare raw tokens against the database.
    let token_hash = hash_token(&token);
    match lookup_session_account(pool, &token_hash).await {
        Ok(Some(account_id)) => Ok(account_id),
        Ok(None) => Err(AuthError::Unauthorized),
        Err(err) => Err(AuthError::Internal(err)),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    request_body = LogoutRequest,
    responses(
        (status = 200, description = "Session revoked", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    payload: Option<Json<LogoutRequest>>,
) -> impl IntoResponse {
    // The token may arrive in the body (clients that cannot set headers) or
    // in the Authorization header; the body wins when both are present.
    let token = payload
        .map(|Json(request)| request.token)
        .or_else(|| extract_bearer_token(&headers));

    if let Some(token) = token {
        let token_hash = hash_token(&token);
        if let Err(err) = delete_session(&pool, &token_hash).await {
            error!("Failed to delete session: {err}");
        }
    }

    // Revocation is idempotent: logout succeeds whether or not a row existed.
    (
        StatusCode::OK,
        Json(MessageResponse {
            message: "Logout successful".to_string(),
        }),
    )
}

pub(super) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::http::HeaderValue;
    use axum::response::IntoResponse;
    use sqlx::postgres::PgPoolOptions;

    #[test]
    fn extract_bearer_token_parses_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(extract_bearer_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn extract_bearer_token_accepts_lowercase_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc123"));
        assert_eq!(extract_bearer_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn extract_bearer_token_rejects_empty_or_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn require_account_rejects_missing_header() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let result = require_account(&HeaderMap::new(), &pool).await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
        Ok(())
    }

    #[tokio::test]
    async fn logout_without_token_still_succeeds() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = logout(HeaderMap::new(), Extension(pool), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }
}
