//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{Action, server::Args};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let app_scheme = matches
        .get_one::<String>("app-scheme")
        .cloned()
        .unwrap_or_else(|| "custode".to_string());

    Ok(Action::Server(Args {
        port,
        dsn,
        app_scheme,
        session_ttl_seconds: matches
            .get_one::<i64>("session-ttl-seconds")
            .copied()
            .unwrap_or(2_592_000),
        reset_token_ttl_seconds: matches
            .get_one::<i64>("reset-token-ttl-seconds")
            .copied()
            .unwrap_or(3600),
        max_login_attempts: matches
            .get_one::<u32>("max-login-attempts")
            .copied()
            .unwrap_or(5),
        lockout_seconds: matches
            .get_one::<u64>("lockout-seconds")
            .copied()
            .unwrap_or(300),
        sendgrid_api_key: matches.get_one::<String>("sendgrid-api-key").cloned(),
        email_from_address: matches
            .get_one::<String>("email-from-address")
            .cloned()
            .unwrap_or_else(|| "no-reply@custode.dev".to_string()),
        email_from_name: matches
            .get_one::<String>("email-from-name")
            .cloned()
            .unwrap_or_else(|| "Custode Team".to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::Action;

    #[test]
    fn dispatch_builds_server_action() {
        temp_env::with_vars(
            [
                ("CUSTODE_SENDGRID_API_KEY", None::<&str>),
                ("CUSTODE_APP_SCHEME", None::<&str>),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec![
                    "custode",
                    "--dsn",
                    "postgres://user@localhost:5432/custode",
                    "--lockout-seconds",
                    "60",
                ]);
                let action = handler(&matches).expect("dispatch should succeed");
                let Action::Server(args) = action;
                assert_eq!(args.port, 8080);
                assert_eq!(args.dsn, "postgres://user@localhost:5432/custode");
                assert_eq!(args.app_scheme, "custode");
                assert_eq!(args.lockout_seconds, 60);
                assert!(args.sendgrid_api_key.is_none());
            },
        );
    }
}
