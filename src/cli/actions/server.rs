use crate::api::{self, email::Mailer, handlers::auth::AuthConfig};
use anyhow::{Context, Result};
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub app_scheme: String,
    pub session_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
    pub max_login_attempts: u32,
    pub lockout_seconds: u64,
    pub sendgrid_api_key: Option<String>,
    pub email_from_address: String,
    pub email_from_name: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the mail client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new()
        .with_app_scheme(args.app_scheme)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_reset_token_ttl_seconds(args.reset_token_ttl_seconds)
        .with_max_login_attempts(args.max_login_attempts)
        .with_lockout_seconds(args.lockout_seconds);

    let mailer = match args.sendgrid_api_key {
        Some(api_key) => Mailer::sendgrid(
            SecretString::from(api_key),
            args.email_from_address,
            args.email_from_name,
        )
        .context("Failed to build SendGrid mail client")?,
        None => Mailer::log(args.email_from_address, args.email_from_name),
    };

    api::new(args.port, args.dsn, auth_config, mailer).await
}
