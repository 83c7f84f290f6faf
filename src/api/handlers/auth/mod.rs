//! Auth handlers and supporting modules.
//!
//! This module coordinates credential hashing, bearer sessions, password
//! reset tokens, and the login rate limiter.
//!
//! ## Login lockout
//!
//! Five failed attempts lock an email for a sliding five-minute window
//! measured from the most recent failure. The counter lives in process
//! memory: it resets on restart and is not shared across instances, an
//! accepted trade-off for a single-instance deployment.
//!
//! ## Token storage
//!
//! Session and reset tokens are 32 bytes from `OsRng`, returned to the client
//! URL-safe base64 encoded, and stored as SHA-256 hex digests. A database
//! leak therefore exposes no usable credentials.

pub(crate) mod error;
pub(crate) mod login;
mod password;
mod rate_limit;
pub(crate) mod register;
pub(crate) mod reset;
pub(crate) mod session;
mod state;
mod storage;
pub(crate) mod types;
mod utils;

pub use rate_limit::{InMemoryLoginLimiter, LoginRateLimiter, NoopLoginLimiter};
pub use state::{AuthConfig, AuthState};
pub(crate) use storage::{
    AccountProfile, delete_account, fetch_account_profile, update_account_profile,
};
