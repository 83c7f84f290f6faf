//! # Custode (Account Management & Authentication API)
//!
//! `custode` is a small account-management backend: registration, login,
//! logout, password reset over emailed deep links, and self-service account
//! CRUD, persisted in `PostgreSQL`.
//!
//! ## Sessions
//!
//! Authentication is bearer-token based. Session tokens are 32 bytes of
//! `OsRng` output, URL-safe base64 encoded, and stored hashed (SHA-256) so a
//! database leak never exposes usable tokens. Tokens expire passively: rows
//! past `expires_at` simply stop validating and are not purged eagerly.
//!
//! ## Password storage
//!
//! Passwords are hashed with Argon2id in PHC string format. Accounts migrated
//! from the legacy deployment may still carry a plaintext secret; those are
//! detected by the self-describing PHC format (not by length) and upgraded
//! transparently on the first successful login.
//!
//! ## Abuse protection
//!
//! Login is guarded by an in-process rate limiter: five failed attempts lock
//! an email for a sliding five-minute window measured from the most recent
//! failure. The limiter sits behind a trait so a shared store can replace it
//! without touching call sites.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
