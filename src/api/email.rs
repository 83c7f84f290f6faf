//! Outbound email delivery.
//!
//! Two delivery backends sit behind [`Mailer`]: a log-only backend for local
//! development (no provider credentials required) and the SendGrid v3 API for
//! real deployments. Callers decide how failures propagate: the welcome email
//! is best-effort, the password reset email is not, because a lost reset
//! email leaves the user locked out of recovery.

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::time::Duration;
use tracing::{Instrument, info, info_span};

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";
// Delivery is always bounded; a hung provider must not hold a request open.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
enum Delivery {
    /// Local dev backend that logs instead of sending.
    Log,
    /// SendGrid v3 mail-send API.
    Sendgrid {
        client: Client,
        api_key: SecretString,
    },
}

#[derive(Debug)]
pub struct Mailer {
    delivery: Delivery,
    from_email: String,
    from_name: String,
}

impl Mailer {
    #[must_use]
    pub fn log(from_email: String, from_name: String) -> Self {
        Self {
            delivery: Delivery::Log,
            from_email,
            from_name,
        }
    }

    /// Build a SendGrid-backed mailer.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn sendgrid(api_key: SecretString, from_email: String, from_name: String) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(SEND_TIMEOUT)
            .build()
            .context("Failed to build SendGrid HTTP client")?;
        Ok(Self {
            delivery: Delivery::Sendgrid { client, api_key },
            from_email,
            from_name,
        })
    }

    /// Name of the active delivery backend, reported by `/health`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match &self.delivery {
            Delivery::Log => "log",
            Delivery::Sendgrid { .. } => "sendgrid",
        }
    }

    /// Send the password reset email. Failure here must reach the caller.
    ///
    /// # Errors
    /// Returns an error when the provider rejects the message or times out.
    pub async fn send_reset_email(
        &self,
        to_email: &str,
        to_name: &str,
        reset_link: &str,
    ) -> Result<()> {
        let (text, html) = reset_bodies(to_name, reset_link);
        self.deliver(to_email, to_name, "Reset your Custode password", &text, &html)
            .await
    }

    /// Send the post-registration welcome email.
    ///
    /// # Errors
    /// Returns an error when the provider rejects the message or times out;
    /// the registration flow downgrades this to a logged warning.
    pub async fn send_welcome_email(&self, to_email: &str, to_name: &str) -> Result<()> {
        let (text, html) = welcome_bodies(to_name);
        self.deliver(to_email, to_name, "Welcome to Custode!", &text, &html)
            .await
    }

    async fn deliver(
        &self,
        to_email: &str,
        to_name: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<()> {
        match &self.delivery {
            Delivery::Log => {
                info!(
                    to_email = %to_email,
                    subject = %subject,
                    body = %text,
                    "email delivery stub"
                );
                Ok(())
            }
            Delivery::Sendgrid { client, api_key } => {
                let payload = json!({
                    "personalizations": [{
                        "to": [{"email": to_email, "name": to_name}],
                    }],
                    "from": {"email": self.from_email, "name": self.from_name},
                    "subject": subject,
                    "content": [
                        {"type": "text/plain", "value": text},
                        {"type": "text/html", "value": html},
                    ],
                });

                let span = info_span!(
                    "email.send",
                    http.method = "POST",
                    url = SENDGRID_SEND_URL
                );
                let response = client
                    .post(SENDGRID_SEND_URL)
                    .bearer_auth(api_key.expose_secret())
                    .json(&payload)
                    .send()
                    .instrument(span)
                    .await
                    .context("failed to reach SendGrid")?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(anyhow!("SendGrid rejected message: {status}: {body}"));
                }

                info!(to_email = %to_email, subject = %subject, "email sent");
                Ok(())
            }
        }
    }
}

fn reset_bodies(to_name: &str, reset_link: &str) -> (String, String) {
    let text = format!(
        "Hi {to_name},\n\n\
         You requested to reset your Custode account password.\n\n\
         Open this link to choose a new password:\n{reset_link}\n\n\
         This link will expire in 1 hour.\n\n\
         If you didn't request this reset, please ignore this email.\n\n\
         Thanks,\nThe Custode Team\n"
    );
    let html = format!(
        "<p>Hi {to_name},</p>\
         <p>You requested to reset your Custode account password.</p>\
         <p><a href=\"{reset_link}\">Reset your password</a></p>\
         <p><strong>This link will expire in 1 hour.</strong></p>\
         <p>If you didn't request this reset, please ignore this email.</p>\
         <p>Thanks,<br>The Custode Team</p>"
    );
    (text, html)
}

fn welcome_bodies(to_name: &str) -> (String, String) {
    let text = format!(
        "Hi {to_name},\n\n\
         Thank you for joining Custode! Your account has been created and you\n\
         can sign in right away.\n\n\
         If you have any questions, just reply to this email.\n\n\
         Thanks,\nThe Custode Team\n"
    );
    let html = format!(
        "<p>Hi {to_name},</p>\
         <p>Thank you for joining Custode! Your account has been created and \
         you can sign in right away.</p>\
         <p>If you have any questions, just reply to this email.</p>\
         <p>Thanks,<br>The Custode Team</p>"
    );
    (text, html)
}
