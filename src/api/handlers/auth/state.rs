//! Auth state and configuration.

use std::sync::Arc;

use crate::api::email::Mailer;

use super::rate_limit::LoginRateLimiter;

const DEFAULT_APP_SCHEME: &str = "custode";
const DEFAULT_SESSION_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;
const DEFAULT_RESET_TOKEN_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_MAX_LOGIN_ATTEMPTS: u32 = 5;
const DEFAULT_LOCKOUT_SECONDS: u64 = 300;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    app_scheme: String,
    session_ttl_seconds: i64,
    reset_token_ttl_seconds: i64,
    max_login_attempts: u32,
    lockout_seconds: u64,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            app_scheme: DEFAULT_APP_SCHEME.to_string(),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            reset_token_ttl_seconds: DEFAULT_RESET_TOKEN_TTL_SECONDS,
            max_login_attempts: DEFAULT_MAX_LOGIN_ATTEMPTS,
            lockout_seconds: DEFAULT_LOCKOUT_SECONDS,
        }
    }

    #[must_use]
    pub fn with_app_scheme(mut self, app_scheme: String) -> Self {
        self.app_scheme = app_scheme;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_reset_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_max_login_attempts(mut self, attempts: u32) -> Self {
        self.max_login_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_lockout_seconds(mut self, seconds: u64) -> Self {
        self.lockout_seconds = seconds;
        self
    }

    pub(super) fn app_scheme(&self) -> &str {
        &self.app_scheme
    }

    pub(super) fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    pub(super) fn reset_token_ttl_seconds(&self) -> i64 {
        self.reset_token_ttl_seconds
    }

    #[must_use]
    pub fn max_login_attempts(&self) -> u32 {
        self.max_login_attempts
    }

    #[must_use]
    pub fn lockout_seconds(&self) -> u64 {
        self.lockout_seconds
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct AuthState {
    config: AuthConfig,
    rate_limiter: Arc<dyn LoginRateLimiter>,
    mailer: Arc<Mailer>,
}

impl AuthState {
    pub fn new(
        config: AuthConfig,
        rate_limiter: Arc<dyn LoginRateLimiter>,
        mailer: Arc<Mailer>,
    ) -> Self {
        Self {
            config,
            rate_limiter,
            mailer,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(super) fn rate_limiter(&self) -> &dyn LoginRateLimiter {
        self.rate_limiter.as_ref()
    }

    pub(crate) fn mailer(&self) -> &Arc<Mailer> {
        &self.mailer
    }
}

#[cfg(test)]
mod tests {
    use super::super::rate_limit::{LoginRateLimiter, NoopLoginLimiter};
    use super::{AuthConfig, AuthState};
    use crate::api::email::Mailer;
    use std::sync::Arc;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new();

        assert_eq!(config.app_scheme(), super::DEFAULT_APP_SCHEME);
        assert_eq!(
            config.session_ttl_seconds(),
            super::DEFAULT_SESSION_TTL_SECONDS
        );
        assert_eq!(
            config.reset_token_ttl_seconds(),
            super::DEFAULT_RESET_TOKEN_TTL_SECONDS
        );
        assert_eq!(
            config.max_login_attempts(),
            super::DEFAULT_MAX_LOGIN_ATTEMPTS
        );
        assert_eq!(config.lockout_seconds(), super::DEFAULT_LOCKOUT_SECONDS);

        let config = config
            .with_app_scheme("lediary".to_string())
            .with_session_ttl_seconds(120)
            .with_reset_token_ttl_seconds(30)
            .with_max_login_attempts(3)
            .with_lockout_seconds(42);

        assert_eq!(config.app_scheme(), "lediary");
        assert_eq!(config.session_ttl_seconds(), 120);
        assert_eq!(config.reset_token_ttl_seconds(), 30);
        assert_eq!(config.max_login_attempts(), 3);
        assert_eq!(config.lockout_seconds(), 42);
    }

    #[test]
    fn auth_state_constructs_with_noop_limiter() {
        let limiter: Arc<dyn LoginRateLimiter> = Arc::new(NoopLoginLimiter);
        let mailer = Arc::new(Mailer::log(
            "no-reply@custode.dev".to_string(),
            "Custode Team".to_string(),
        ));
        let state = AuthState::new(AuthConfig::new(), limiter, mailer);
        assert_eq!(state.config().app_scheme(), "custode");
        assert!(!state.rate_limiter().is_locked("alice@example.com"));
    }
}
