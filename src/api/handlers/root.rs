//! Service banner served at `/`.

use axum::{extract::Extension, response::IntoResponse, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::AuthState;

#[derive(Serialize, Deserialize, Debug)]
pub struct Banner {
    message: String,
    version: String,
    status: String,
    email_configured: bool,
}

pub async fn root(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    Json(Banner {
        message: "Welcome to the Custode API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
        email_configured: auth_state.mailer().kind() == "sendgrid",
    })
}
