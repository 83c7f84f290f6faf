use clap::{Arg, Command};

pub fn with_args(command: Command) -> Command {
    let command = with_token_args(command);
    let command = with_limiter_args(command);
    with_email_args(command)
}

fn with_token_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("app-scheme")
                .long("app-scheme")
                .help("Deep-link scheme used for password reset links")
                .env("CUSTODE_APP_SCHEME")
                .default_value("custode"),
        )
        .arg(
            Arg::new("session-ttl-seconds")
                .long("session-ttl-seconds")
                .help("Session token TTL in seconds")
                .env("CUSTODE_SESSION_TTL_SECONDS")
                .default_value("2592000")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("reset-token-ttl-seconds")
                .long("reset-token-ttl-seconds")
                .help("Password reset token TTL in seconds")
                .env("CUSTODE_RESET_TOKEN_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_limiter_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("max-login-attempts")
                .long("max-login-attempts")
                .help("Failed login attempts before an email is locked out")
                .env("CUSTODE_MAX_LOGIN_ATTEMPTS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("lockout-seconds")
                .long("lockout-seconds")
                .help("Sliding lockout window, measured from the most recent failure")
                .env("CUSTODE_LOCKOUT_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64)),
        )
}

fn with_email_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("sendgrid-api-key")
                .long("sendgrid-api-key")
                .help("SendGrid API key; when absent, outbound email is logged instead of sent")
                .env("CUSTODE_SENDGRID_API_KEY"),
        )
        .arg(
            Arg::new("email-from-address")
                .long("email-from-address")
                .help("From address for outbound email")
                .env("CUSTODE_EMAIL_FROM_ADDRESS")
                .default_value("no-reply@custode.dev"),
        )
        .arg(
            Arg::new("email-from-name")
                .long("email-from-name")
                .help("From display name for outbound email")
                .env("CUSTODE_EMAIL_FROM_NAME")
                .default_value("Custode Team"),
        )
}
