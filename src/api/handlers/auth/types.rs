//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Format: YYYY-MM-DD
    pub date_of_birth: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Account body returned to clients; the password column is never included.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub account: AccountResponse,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LogoutRequest {
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn register_request_round_trips() -> Result<()> {
        let request = RegisterRequest {
            name: "Alice Example".to_string(),
            email: "alice@example.com".to_string(),
            phone: "0412345678".to_string(),
            date_of_birth: "1990-01-15".to_string(),
            password: "Passw0rd".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let email = value
            .get("email")
            .and_then(serde_json::Value::as_str)
            .context("missing email")?;
        assert_eq!(email, "alice@example.com");
        let decoded: RegisterRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.date_of_birth, "1990-01-15");
        Ok(())
    }

    #[test]
    fn auth_response_excludes_password() -> Result<()> {
        let response = AuthResponse {
            message: "Login successful".to_string(),
            token: "token".to_string(),
            account: AccountResponse {
                id: 1,
                name: "Alice Example".to_string(),
                email: "alice@example.com".to_string(),
                phone: "0412345678".to_string(),
                date_of_birth: "1990-01-15".to_string(),
            },
        };
        let value = serde_json::to_value(&response)?;
        let account = value.get("account").context("missing account")?;
        assert!(account.get("password").is_none());
        Ok(())
    }

    #[test]
    fn reset_password_request_round_trips() -> Result<()> {
        let request = ResetPasswordRequest {
            token: "reset-token".to_string(),
            new_password: "NewPassw0rd".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let decoded: ResetPasswordRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.token, "reset-token");
        Ok(())
    }
}
